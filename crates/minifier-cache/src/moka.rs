use async_trait::async_trait;
use minifier_core::cache::Result;
use minifier_core::LookupCache;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with, capped by an
/// optional ceiling. Reads never extend an entry's life.
#[derive(Debug, Clone, Copy)]
struct PerEntryTtl {
    max_ttl: Option<Duration>,
}

impl PerEntryTtl {
    fn ttl_for(&self, entry: &Entry) -> Duration {
        match self.max_ttl {
            Some(max) => entry.ttl.min(max),
            None => entry.ttl,
        }
    }
}

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.ttl_for(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.ttl_for(value))
    }
}

/// An in-process [`LookupCache`] backed by Moka.
///
/// Every entry honours the TTL passed to [`LookupCache::set`]. Suitable for
/// single-node deployments or as the only cache in tests.
#[derive(Debug, Clone)]
pub struct MokaLookupCache {
    cache: Cache<String, Entry>,
}

impl MokaLookupCache {
    /// Creates a cache holding at most 10,000 entries.
    pub fn new() -> Self {
        CacheConfig::default().into()
    }

    /// Creates a cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        CacheConfig::builder().max_capacity(max_capacity).build().into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MokaLookupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LookupCache for MokaLookupCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.cache.get(key).await {
            Some(entry) => {
                debug!(key, "cache hit in moka");
                Ok(Some(entry.value))
            }
            None => {
                trace!(key, "cache miss in moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        trace!(key, ttl_ms = ttl.as_millis() as u64, "storing value in moka");
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        trace!(key, "removed value from moka (if present)");
        Ok(())
    }
}

/// Configuration for creating a [`MokaLookupCache`].
#[derive(Debug, TypedBuilder, Default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Upper bound applied to every per-entry TTL.
    #[builder(default, setter(strip_option))]
    max_ttl: Option<Duration>,
}

impl From<CacheConfig> for MokaLookupCache {
    fn from(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY))
            .expire_after(PerEntryTtl {
                max_ttl: config.max_ttl,
            })
            .build();

        MokaLookupCache { cache }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaLookupCache::new();

        assert!(cache.get("code:abc1234").await.unwrap().is_none());

        cache.set("code:abc1234", "payload", HOUR).await.unwrap();

        assert_eq!(
            cache.get("code:abc1234").await.unwrap().as_deref(),
            Some("payload")
        );
    }

    #[tokio::test]
    async fn set_overwrites_value() {
        let cache = MokaLookupCache::new();

        cache.set("k", "first", HOUR).await.unwrap();
        cache.set("k", "second", HOUR).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn cache_del_is_idempotent() {
        let cache = MokaLookupCache::new();

        cache.del("k").await.unwrap();
        cache.set("k", "v", HOUR).await.unwrap();
        cache.del("k").await.unwrap();
        cache.del("k").await.unwrap();

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_their_own_ttl() {
        let cache = MokaLookupCache::new();

        cache
            .set("short", "v", Duration::from_millis(50))
            .await
            .unwrap();
        cache.set("long", "v", HOUR).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rewrite_resets_ttl() {
        let cache = MokaLookupCache::new();

        cache.set("k", "v", HOUR).await.unwrap();
        cache.set("k", "v", Duration::from_millis(50)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn max_ttl_caps_entry_ttl() {
        let cache: MokaLookupCache = MokaLookupCache::builder()
            .max_capacity(100)
            .max_ttl(Duration::from_millis(50))
            .build()
            .into();

        cache.set("k", "v", HOUR).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_handles_many_entries() {
        let cache = MokaLookupCache::with_capacity(100);

        for i in 0..50 {
            cache
                .set(&format!("code:{i}"), &format!("https://example{i}"), HOUR)
                .await
                .unwrap();
        }

        assert_eq!(
            cache.get("code:0").await.unwrap().as_deref(),
            Some("https://example0")
        );
        assert_eq!(
            cache.get("code:49").await.unwrap().as_deref(),
            Some("https://example49")
        );
    }
}
