use crate::error::CacheError;
use crate::record::{RecordId, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// An ephemeral, string-keyed cache with per-entry TTL.
///
/// Every operation is best effort. A miss is `Ok(None)`, and a backend may
/// drop entries before their TTL runs out; callers must treat both the same.
#[async_trait]
pub trait LookupCache: Send + Sync + 'static {
    /// Get a value from the cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that should live for at most `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a value.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, key: &str) -> Result<()>;

    /// Releases backend resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// The two keys a record is cached under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    Id(&'a RecordId),
    Code(&'a ShortCode),
}

impl<'a> CacheKey<'a> {
    /// Both keys of `record`, id first.
    pub fn for_record(record: &'a UrlRecord) -> [CacheKey<'a>; 2] {
        [CacheKey::Id(&record.id), CacheKey::Code(&record.short_code)]
    }
}

impl Display for CacheKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Id(id) => write!(f, "id:{}", id),
            CacheKey::Code(code) => write!(f, "code:{}", code),
        }
    }
}
