use std::time::Duration;
use typed_builder::TypedBuilder;

/// Tunables for a [`UrlCatalog`](crate::UrlCatalog).
///
/// ```
/// use minifier_catalog::CatalogConfig;
/// use std::time::Duration;
///
/// let config = CatalogConfig::builder()
///     .default_lifetime(Duration::from_secs(3600))
///     .max_attempts(5)
///     .build();
/// assert_eq!(config.cache_ttl, Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct CatalogConfig {
    /// Lifetime of a record created without an explicit `expires_in`.
    #[builder(default = Duration::from_secs(24 * 3600))]
    pub default_lifetime: Duration,
    /// Upper bound for cache entries; never exceeds the record's remaining life.
    #[builder(default = Duration::from_secs(24 * 3600))]
    pub cache_ttl: Duration,
    /// Derived-code candidates tried before giving up.
    #[builder(default = 3)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_secs(5))]
    pub store_timeout: Duration,
    #[builder(default = Duration::from_millis(500))]
    pub cache_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
