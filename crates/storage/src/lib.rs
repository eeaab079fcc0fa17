//! Storage layer for disaster-dedup
//!
//! PostgreSQL backend (sqlx) plus an in-memory backend with the same
//! transaction semantics.

pub mod error;
mod memory;
mod pg_migrations;
mod pg_storage;
pub mod traits;

pub use error::StorageError;
pub use memory::{InMemoryStorage, InMemoryTransaction};
pub use pg_migrations::run_pg_migrations;
pub use pg_storage::{PgRecordTransaction, PgStorage};
pub use traits::{DedupLogStore, RecordStore, RecordTransaction, ReportStore};
