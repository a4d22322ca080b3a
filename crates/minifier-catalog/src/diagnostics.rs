//! Side channel for failures that must not change an operation's result.

use minifier_core::{CacheError, RecordId, StorageError};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// A secondary failure observed while serving a request.
#[derive(Debug, Clone, Error)]
pub enum Diagnostic {
    #[error("cache read failed for {key}: {error}")]
    CacheReadFailed { key: String, error: CacheError },
    #[error("cache entry {key} could not be used: {message}")]
    CacheDecodeFailed { key: String, message: String },
    #[error("cache write failed for {key}: {error}")]
    CacheWriteFailed { key: String, error: CacheError },
    #[error("cache eviction failed for {key}: {error}")]
    CacheEvictFailed { key: String, error: CacheError },
    #[error("failed to purge expired record {id}: {error}")]
    ExpiredPurgeFailed { id: RecordId, error: StorageError },
}

/// Receives [`Diagnostic`]s from the catalog.
///
/// Called inline on the request path; implementations should not block.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Logs every diagnostic at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(diagnostic = %diagnostic, "degraded operation");
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.report(Diagnostic::CacheDecodeFailed {
            key: "code:a".to_string(),
            message: "bad".to_string(),
        });
        sink.report(Diagnostic::CacheEvictFailed {
            key: "code:a".to_string(),
            error: CacheError::Unavailable("down".to_string()),
        });

        let seen = sink.diagnostics();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Diagnostic::CacheDecodeFailed { .. }));
        assert_eq!(
            seen[1].to_string(),
            "cache eviction failed for code:a: cache backend unavailable: down"
        );
    }
}
