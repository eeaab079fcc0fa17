//! Storage backend trait abstraction
//!
//! The dedup run reads and writes records through a [`RecordTransaction`]
//! so the orchestrator decides where commit boundaries fall. Dropping a
//! transaction without calling [`RecordTransaction::commit`] rolls it back.

use async_trait::async_trait;
use disaster_dedup_core::{DedupRunSummary, DisasterEventRecord, MergedFields, RecordId};

use crate::error::StorageError;

/// Opens transactions over the disaster-event record table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>, StorageError>;
}

/// Unit of work over records. Writes are visible to later reads in the same
/// transaction and to everyone else only after commit.
#[async_trait]
pub trait RecordTransaction: Send {
    /// All records, ascending by id.
    async fn fetch_all(&mut self) -> Result<Vec<DisasterEventRecord>, StorageError>;

    /// Records whose id is in `ids`, ascending by id. Missing ids are skipped.
    async fn fetch_by_ids(
        &mut self,
        ids: &[RecordId],
    ) -> Result<Vec<DisasterEventRecord>, StorageError>;

    /// Set `checked = true`. Returns the number of rows touched.
    async fn mark_checked(&mut self, ids: &[RecordId]) -> Result<u64, StorageError>;

    /// Overwrite a surviving record with merged fields.
    ///
    /// # Errors
    /// `StorageError::NotFound` if the record does not exist.
    async fn update_merged(
        &mut self,
        id: RecordId,
        fields: &MergedFields,
    ) -> Result<(), StorageError>;

    /// Delete records. Returns the number of rows removed.
    async fn delete_records(&mut self, ids: &[RecordId]) -> Result<u64, StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Audit log of completed dedup runs.
#[async_trait]
pub trait DedupLogStore: Send + Sync {
    async fn save_dedup_log(&self, summary: &DedupRunSummary) -> Result<(), StorageError>;

    /// Most recent runs first.
    async fn list_dedup_logs(&self, limit: usize) -> Result<Vec<DedupRunSummary>, StorageError>;
}

/// Source reports that records point back to.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Delete reports that no longer own any record. Returns the count removed.
    async fn delete_orphan_reports(&self) -> Result<u64, StorageError>;
}
