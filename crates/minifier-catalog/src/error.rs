use minifier_core::{CoreError, StorageError};
use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors returned by [`UrlCatalog`](crate::UrlCatalog).
///
/// Cache failures never appear here; they are reported to the
/// [`DiagnosticSink`](crate::DiagnosticSink) instead.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),
    #[error("short code already exists: {0}")]
    CodeExists(String),
    #[error("short url not found: {0}")]
    NotFound(String),
    #[error("short url has expired: {0}")]
    Expired(String),
    #[error("not authorized to modify {0}")]
    Unauthorized(String),
    #[error("no free short code after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
    #[error("failed to generate record id: {0}")]
    IdGeneration(String),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CatalogError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(what) => Self::NotFound(what),
            other => Self::Storage(other),
        }
    }
}

impl From<CoreError> for CatalogError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidAlias(message),
            CoreError::InvalidUrl(message) => Self::InvalidUrl(message),
        }
    }
}
