//! The URL catalog: creation, lookup, deletion, and listing of short links
//! over a pluggable [`RecordStore`](minifier_core::RecordStore) and
//! [`LookupCache`](minifier_core::LookupCache).

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod id;
pub mod request;

pub use catalog::UrlCatalog;
pub use config::CatalogConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use error::{CatalogError, Result};
pub use id::IdSource;
pub use request::CreateUrlRequest;
