//! [`RecordStore`](minifier_core::RecordStore) implementations.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRecordStore;
pub use mysql::MySqlRecordStore;
