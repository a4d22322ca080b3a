use async_trait::async_trait;
use minifier_core::cache::Result;
use minifier_core::LookupCache;
use std::time::Duration;
use tracing::debug;

/// A cache that stores nothing; every lookup misses.
///
/// Used when caching is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("caching disabled");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LookupCache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_misses() {
        let cache = NullCache::new();

        cache
            .set("code:abc1234", "payload", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("code:abc1234").await.unwrap(), None);
        cache.del("code:abc1234").await.unwrap();
    }
}
