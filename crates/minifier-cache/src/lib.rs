//! [`LookupCache`](minifier_core::LookupCache) implementations.

pub mod moka;
pub mod null;
pub mod redis;

pub use moka::{CacheConfig, MokaLookupCache};
pub use null::NullCache;
pub use redis::RedisLookupCache;
