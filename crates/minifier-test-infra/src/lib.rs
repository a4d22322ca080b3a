//! Disposable containers for integration tests.
//!
//! Each fixture owns its container and stops it on drop. The MySQL fixture
//! connects with retries and applies the caller's schema, so tests start
//! from a usable database.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
