//! Core types and traits for the Minifier URL shortener.
//!
//! This crate holds the record model, the deterministic short-code
//! generator, and the two storage contracts the catalog is built on:
//! [`RecordStore`] (durable) and [`LookupCache`] (ephemeral).

pub mod base62;
pub mod cache;
pub mod codegen;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod store;
pub mod validation;

pub use cache::{CacheKey, LookupCache};
pub use codegen::CodeGenerator;
pub use error::{CacheError, CoreError, StorageError, StoreOp};
pub use record::{RecordId, UrlRecord};
pub use shortcode::ShortCode;
pub use store::RecordStore;
pub use validation::validate_url;
