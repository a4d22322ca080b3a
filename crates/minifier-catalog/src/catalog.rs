use crate::config::CatalogConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{CatalogError, Result};
use crate::id::IdSource;
use crate::request::CreateUrlRequest;
use jiff::{SignedDuration, Timestamp};
use minifier_core::{
    validate_url, CacheError, CacheKey, CodeGenerator, LookupCache, RecordId, RecordStore,
    ShortCode, StorageError, StoreOp, UrlRecord,
};
use minifier_snowflake::{Snowflake, SnowflakeSettings, MAX_NODE_ID};
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How many fresh ids an insert draws before giving up on id collisions.
const MAX_ID_DRAWS: u32 = 5;

/// Creates, resolves, deletes, and lists short URLs.
///
/// The store holds the durable copy of every record. The cache holds a
/// disposable projection under `id:<id>` and `code:<code>`; a cache hit is
/// re-checked for expiry and code match before it is trusted, and every cache
/// failure degrades to a store read plus a [`Diagnostic`].
///
/// All methods take `&self`; share the catalog behind an `Arc`.
pub struct UrlCatalog<S: ?Sized, C: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    ids: Arc<dyn IdSource>,
    diagnostics: Arc<dyn DiagnosticSink>,
    generator: CodeGenerator,
    config: CatalogConfig,
    closed: AtomicBool,
}

impl<S: RecordStore, C: LookupCache> UrlCatalog<S, C> {
    /// Creates a catalog that owns `store` and `cache`.
    pub fn new(store: S, cache: C) -> Result<Self> {
        Self::from_shared(Arc::new(store), Arc::new(cache))
    }
}

impl<S, C> UrlCatalog<S, C>
where
    S: RecordStore + ?Sized,
    C: LookupCache + ?Sized,
{
    /// Creates a catalog over shared handles.
    ///
    /// Ids come from a snowflake generator on a random node and diagnostics
    /// go to [`TracingSink`] until replaced. Deployments with several
    /// catalogs over one store should assign distinct node ids through
    /// [`with_id_source`](Self::with_id_source); an id that still collides
    /// is redrawn on insert.
    pub fn from_shared(store: Arc<S>, cache: Arc<C>) -> Result<Self> {
        let node_id = rand::rng().random_range(0..=MAX_NODE_ID);
        let ids = Snowflake::new(SnowflakeSettings::builder().node_id(node_id).build())
            .map_err(|e| CatalogError::IdGeneration(e.to_string()))?;
        debug!(node_id, "catalog uses a random snowflake node");

        Ok(Self {
            store,
            cache,
            ids: Arc::new(ids),
            diagnostics: Arc::new(TracingSink),
            generator: CodeGenerator::new(),
            config: CatalogConfig::default(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn with_config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_code_generator(mut self, generator: CodeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn code_generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Shortens `request.long_url` on behalf of `request.owner_id`.
    ///
    /// With a custom alias the alias is the code or the call fails with
    /// [`CatalogError::CodeExists`]. Otherwise a code is derived from the URL
    /// and owner, trying up to `max_attempts` candidates.
    pub async fn create_url(&self, request: CreateUrlRequest) -> Result<UrlRecord> {
        validate_url(&request.long_url)?;

        let created_at = truncate_to_millis(Timestamp::now());
        let lifetime = request.expires_in.unwrap_or(self.config.default_lifetime);
        let expires_at = expiry_after(created_at, lifetime)?;

        let record = match request.custom_alias.as_deref() {
            Some(alias) => {
                self.create_with_alias(&request, alias, created_at, expires_at)
                    .await?
            }
            None => {
                self.create_with_derived_code(&request, created_at, expires_at)
                    .await?
            }
        };

        info!(
            id = %record.id,
            code = %record.short_code,
            owner = %record.owner_id,
            "short url created"
        );

        self.write_through(&record, Timestamp::now()).await;
        Ok(record)
    }

    async fn create_with_alias(
        &self,
        request: &CreateUrlRequest,
        alias: &str,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<UrlRecord> {
        let code = self.generator.validate_alias(alias)?;

        if !self.claim_code(&code).await? {
            return Err(CatalogError::CodeExists(code.to_string()));
        }

        self.insert_record(request, &code, true, created_at, expires_at)
            .await?
            .ok_or_else(|| CatalogError::CodeExists(code.to_string()))
    }

    async fn create_with_derived_code(
        &self,
        request: &CreateUrlRequest,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<UrlRecord> {
        for attempt in 0..self.config.max_attempts {
            let code =
                self.generator
                    .derive_code_for_attempt(&request.long_url, &request.owner_id, attempt);

            if !self.claim_code(&code).await? {
                debug!(code = %code, attempt, "derived code is taken");
                continue;
            }

            match self
                .insert_record(request, &code, false, created_at, expires_at)
                .await?
            {
                Some(record) => return Ok(record),
                None => debug!(code = %code, attempt, "derived code claimed concurrently"),
            }
        }

        warn!(
            attempts = self.config.max_attempts,
            owner = %request.owner_id,
            "no free derived code"
        );
        Err(CatalogError::ExhaustedRetries {
            attempts: self.config.max_attempts,
        })
    }

    /// Resolves `code` to its live record.
    ///
    /// An expired record is purged from the store and cache and reported as
    /// [`CatalogError::Expired`], even if the purge itself fails.
    pub async fn get_url(&self, code: &str) -> Result<UrlRecord> {
        // Anything that is not a well-formed code cannot have been stored.
        let Ok(code) = ShortCode::new(code) else {
            return Err(CatalogError::NotFound(code.to_string()));
        };

        let (record, from_cache) = match self.cached_record(&code).await {
            Some(record) => (record, true),
            None => (
                self.store_call(StoreOp::Find, self.store.find_by_code(&code))
                    .await?,
                false,
            ),
        };

        let now = Timestamp::now();
        if record.is_expired_at(now) {
            debug!(code = %code, expires_at = %record.expires_at, "record has expired");
            self.purge_expired(&record).await;
            return Err(CatalogError::Expired(code.to_string()));
        }

        if !from_cache {
            self.write_through(&record, now).await;
        }

        debug!(code = %code, url = %record.long_url, from_cache, "resolved short code");
        Ok(record)
    }

    /// Deletes the record `id` if `requesting_owner` owns it.
    pub async fn delete_url(&self, id: &RecordId, requesting_owner: &str) -> Result<()> {
        let record = self
            .store_call(StoreOp::Find, self.store.find_by_id(id))
            .await?;

        if !record.is_owned_by(requesting_owner) {
            debug!(id = %id, requesting_owner, "delete refused for non-owner");
            return Err(CatalogError::Unauthorized(id.to_string()));
        }

        self.store_call(StoreOp::Delete, self.store.delete(id))
            .await?;
        self.evict(&record).await;

        info!(id = %id, code = %record.short_code, "short url deleted");
        Ok(())
    }

    /// Lists the live records of `owner_id`, in no particular order.
    pub async fn list_user_urls(&self, owner_id: &str) -> Result<Vec<UrlRecord>> {
        let records = self
            .store_call(StoreOp::List, self.store.list_by_owner(owner_id))
            .await?;

        let now = Timestamp::now();
        Ok(records
            .into_iter()
            .filter(|record| !record.is_expired_at(now))
            .collect())
    }

    /// Releases the store and then the cache. Later calls are no-ops.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let store_result = self
            .store_call(StoreOp::Close, self.store.close())
            .await;

        if let Err(error) = self.cache_call(self.cache.close()).await {
            warn!(error = %error, "failed to close cache");
        }

        debug!("catalog closed");
        store_result.map_err(CatalogError::from)
    }

    /// Decides whether `code` can be inserted.
    ///
    /// A code held by an expired record is logically free: the holder is
    /// purged and the code reported as available.
    async fn claim_code(&self, code: &ShortCode) -> Result<bool> {
        if self
            .store_call(StoreOp::Count, self.store.code_available(code))
            .await?
        {
            return Ok(true);
        }

        let holder = match self
            .store_call(StoreOp::Find, self.store.find_by_code(code))
            .await
        {
            Ok(holder) => holder,
            // released between the probe and the read
            Err(StorageError::NotFound(_)) => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        if !holder.is_expired_at(Timestamp::now()) {
            return Ok(false);
        }

        debug!(code = %code, id = %holder.id, "reclaiming code from expired record");
        match self
            .store_call(StoreOp::Delete, self.store.delete(&holder.id))
            .await
        {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.evict(&holder).await;

        Ok(true)
    }

    fn new_record(
        &self,
        request: &CreateUrlRequest,
        short_code: ShortCode,
        is_alias: bool,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<UrlRecord> {
        Ok(UrlRecord {
            id: self.ids.next_id()?,
            long_url: request.long_url.clone(),
            custom_alias: is_alias.then(|| short_code.clone()),
            short_code,
            owner_id: request.owner_id.clone(),
            created_at,
            expires_at,
        })
    }

    /// Inserts a record holding `code`, or returns `None` if another record
    /// claimed the code first. A taken record id is not a code clash: a fresh
    /// id is drawn and the insert repeated.
    async fn insert_record(
        &self,
        request: &CreateUrlRequest,
        code: &ShortCode,
        is_alias: bool,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Option<UrlRecord>> {
        for _ in 0..MAX_ID_DRAWS {
            let record = self.new_record(request, code.clone(), is_alias, created_at, expires_at)?;
            match self
                .store_call(StoreOp::Insert, self.store.insert(record.clone()))
                .await
            {
                Ok(()) => return Ok(Some(record)),
                Err(StorageError::Duplicate(_)) => return Ok(None),
                Err(StorageError::DuplicateId(id)) => {
                    warn!(id = %id, code = %code, "record id already taken, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CatalogError::IdGeneration(format!(
            "record id collided {MAX_ID_DRAWS} times in a row"
        )))
    }

    async fn cached_record(&self, code: &ShortCode) -> Option<UrlRecord> {
        let key = CacheKey::Code(code).to_string();

        let payload = match self.cache_call(self.cache.get(&key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                trace!(key = %key, "cache miss");
                return None;
            }
            Err(error) => {
                self.diagnostics
                    .report(Diagnostic::CacheReadFailed { key, error });
                return None;
            }
        };

        match serde_json::from_str::<UrlRecord>(&payload) {
            Ok(record) if record.short_code == *code => {
                trace!(key = %key, "cache hit");
                Some(record)
            }
            Ok(record) => {
                self.diagnostics.report(Diagnostic::CacheDecodeFailed {
                    key,
                    message: format!("entry holds code {}", record.short_code),
                });
                None
            }
            Err(e) => {
                self.diagnostics.report(Diagnostic::CacheDecodeFailed {
                    key: key.clone(),
                    message: e.to_string(),
                });
                self.evict_key(key).await;
                None
            }
        }
    }

    /// Caches `record` under both keys for no longer than it has left to live.
    async fn write_through(&self, record: &UrlRecord, now: Timestamp) {
        let Some(remaining) = record.remaining_lifetime(now) else {
            return;
        };
        let ttl = remaining.min(self.config.cache_ttl);

        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                self.diagnostics.report(Diagnostic::CacheWriteFailed {
                    key: CacheKey::Id(&record.id).to_string(),
                    error: CacheError::Serialization(e.to_string()),
                });
                return;
            }
        };

        for key in CacheKey::for_record(record) {
            let key = key.to_string();
            if let Err(error) = self.cache_call(self.cache.set(&key, &payload, ttl)).await {
                self.diagnostics
                    .report(Diagnostic::CacheWriteFailed { key, error });
            }
        }
    }

    /// Best-effort removal of an expired record from the store and cache.
    async fn purge_expired(&self, record: &UrlRecord) {
        match self
            .store_call(StoreOp::Delete, self.store.delete(&record.id))
            .await
        {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(error) => self.diagnostics.report(Diagnostic::ExpiredPurgeFailed {
                id: record.id.clone(),
                error,
            }),
        }
        self.evict(record).await;
    }

    async fn evict(&self, record: &UrlRecord) {
        for key in CacheKey::for_record(record) {
            self.evict_key(key.to_string()).await;
        }
    }

    async fn evict_key(&self, key: String) {
        if let Err(error) = self.cache_call(self.cache.del(&key)).await {
            self.diagnostics
                .report(Diagnostic::CacheEvictFailed { key, error });
        }
    }

    async fn store_call<T>(
        &self,
        op: StoreOp,
        call: impl Future<Output = std::result::Result<T, StorageError>>,
    ) -> std::result::Result<T, StorageError> {
        let limit = self.config.store_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| {
                Err(StorageError::Timeout {
                    op,
                    message: format!("no response within {limit:?}"),
                })
            })
    }

    async fn cache_call<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, CacheError>>,
    ) -> std::result::Result<T, CacheError> {
        let limit = self.config.cache_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(CacheError::Timeout(format!("no response within {limit:?}"))))
    }
}

impl<S: ?Sized, C: ?Sized> std::fmt::Debug for UrlCatalog<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlCatalog")
            .field("generator", &self.generator)
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Record timestamps carry millisecond precision, the finest any store keeps.
fn truncate_to_millis(ts: Timestamp) -> Timestamp {
    Timestamp::from_millisecond(ts.as_millisecond()).unwrap_or(ts)
}

fn expiry_after(created_at: Timestamp, lifetime: Duration) -> Result<Timestamp> {
    if lifetime < Duration::from_millis(1) {
        return Err(CatalogError::InvalidExpiry(
            "lifetime must be at least one millisecond".to_string(),
        ));
    }

    SignedDuration::try_from(lifetime)
        .ok()
        .and_then(|lifetime| created_at.checked_add(lifetime).ok())
        .map(truncate_to_millis)
        .ok_or_else(|| CatalogError::InvalidExpiry(format!("lifetime {lifetime:?} is too large")))
}
