use crate::error::StorageError;
use crate::record::{RecordId, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for record-store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable persistence for [`UrlRecord`]s.
///
/// Implementations enforce uniqueness of `short_code` and support lookups by
/// owner. Records are returned as stored, expired or not: expiry policy is
/// applied by the caller.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Inserts a new record.
    ///
    /// Returns [`StorageError::Duplicate`] if the short code is already
    /// present and [`StorageError::DuplicateId`] if the id is. This is the
    /// authoritative uniqueness check.
    async fn insert(&self, record: UrlRecord) -> Result<()>;

    /// Fetches the record holding `code`, or [`StorageError::NotFound`].
    async fn find_by_code(&self, code: &ShortCode) -> Result<UrlRecord>;

    /// Fetches the record with `id`, or [`StorageError::NotFound`].
    async fn find_by_id(&self, id: &RecordId) -> Result<UrlRecord>;

    /// Removes exactly one record.
    ///
    /// Returns [`StorageError::NotFound`] if nothing was removed.
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Probes whether `code` is free.
    ///
    /// Racy against concurrent inserts; only an optimization.
    async fn code_available(&self, code: &ShortCode) -> Result<bool>;

    /// Lists every record owned by `owner_id`, in no particular order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>>;

    /// Releases backend resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
