use async_trait::async_trait;
use minifier_core::cache::Result;
use minifier_core::{CacheError, LookupCache};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

const DEFAULT_KEY_PREFIX: &str = "minifier:";

/// A Redis-backed [`LookupCache`].
///
/// Values are stored as plain strings under namespaced keys and expire via
/// `PSETEX`.
#[derive(Debug, Clone)]
pub struct RedisLookupCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisLookupCache {
    /// Creates a cache over an existing multiplexed connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a cache with a custom key prefix (e.g. `"myapp:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and establishes a multiplexed connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("failed to connect to redis: {e}")))?;
        debug!("connected to redis");
        Ok(Self::new(conn))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

/// PSETEX rejects zero; round sub-millisecond TTLs up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl LookupCache for RedisLookupCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespaced(key);
        trace!(key = %key, "fetching value from redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "cache hit in redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key = %key, "cache miss in redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "redis error on get");
                Err(map_redis_error("failed to fetch value from redis", e))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let key = self.namespaced(key);
        trace!(key = %key, "storing value in redis");

        let mut conn = self.conn.clone();
        match conn.pset_ex::<_, _, ()>(&key, value, ttl_millis(ttl)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to write value to redis");
                Err(map_redis_error("failed to write value to redis", e))
            }
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        let key = self.namespaced(key);
        trace!(key = %key, "removing value from redis");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to remove value from redis");
                Err(map_redis_error("failed to delete value from redis", e))
            }
        }
    }
}
