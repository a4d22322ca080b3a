use std::fmt::Display;
use thiserror::Error;

/// Validation errors raised by the core types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Errors raised by [`LookupCache`](crate::LookupCache) implementations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// The record-store operation a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Insert,
    Find,
    Delete,
    Count,
    List,
    Close,
}

impl Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            StoreOp::Insert => "store/insert",
            StoreOp::Find => "store/find",
            StoreOp::Delete => "store/delete",
            StoreOp::Count => "store/count",
            StoreOp::List => "store/list",
            StoreOp::Close => "store/close",
        };
        f.write_str(tag)
    }
}

/// Errors raised by [`RecordStore`](crate::RecordStore) implementations.
///
/// Backend failures carry the [`StoreOp`] they came from.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Duplicate(String),
    #[error("record id already exists: {0}")]
    DuplicateId(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("{op}: storage backend unavailable: {message}")]
    Unavailable { op: StoreOp, message: String },
    #[error("{op}: storage operation timed out: {message}")]
    Timeout { op: StoreOp, message: String },
    #[error("{op}: storage query failed: {message}")]
    Query { op: StoreOp, message: String },
    #[error("{op}: stored data is invalid: {message}")]
    InvalidData { op: StoreOp, message: String },
}

impl StorageError {
    /// Returns the operation tag for backend failures.
    pub fn op(&self) -> Option<StoreOp> {
        match self {
            StorageError::Duplicate(_)
            | StorageError::DuplicateId(_)
            | StorageError::NotFound(_) => None,
            StorageError::Unavailable { op, .. }
            | StorageError::Timeout { op, .. }
            | StorageError::Query { op, .. }
            | StorageError::InvalidData { op, .. } => Some(*op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_carry_operation_tag() {
        let err = StorageError::Query {
            op: StoreOp::Insert,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.op(), Some(StoreOp::Insert));
        assert_eq!(
            err.to_string(),
            "store/insert: storage query failed: connection reset"
        );
        assert_eq!(StorageError::NotFound("abc".into()).op(), None);
    }
}
