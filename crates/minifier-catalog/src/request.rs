use std::time::Duration;
use typed_builder::TypedBuilder;

/// Input to [`UrlCatalog::create_url`](crate::UrlCatalog::create_url).
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateUrlRequest {
    #[builder(setter(into))]
    pub long_url: String,
    #[builder(setter(into))]
    pub owner_id: String,
    /// Requested short code; when absent one is derived from the URL and owner.
    #[builder(default, setter(into, strip_option))]
    pub custom_alias: Option<String>,
    /// Lifetime of the record; the catalog default applies when absent.
    #[builder(default, setter(strip_option))]
    pub expires_in: Option<Duration>,
}
