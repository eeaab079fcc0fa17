//! In-memory storage backend.
//!
//! Thread-safe implementation of the storage traits for tests and embedded
//! use. A transaction works on a private copy of the record table and keeps
//! a log of its writes; commit replays the log onto shared state.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use disaster_dedup_core::{DedupRunSummary, DisasterEventRecord, MergedFields, RecordId, ReportId};

use crate::error::StorageError;
use crate::traits::{DedupLogStore, RecordStore, RecordTransaction, ReportStore};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Transaction(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<RecordId, DisasterEventRecord>,
    reports: BTreeMap<ReportId, String>,
    dedup_logs: Vec<DedupRunSummary>,
    next_record_id: i64,
    next_report_id: i64,
    failing_updates: HashSet<RecordId>,
}

#[derive(Debug, Clone)]
enum StagedWrite {
    MarkChecked(Vec<RecordId>),
    Update(RecordId, MergedFields),
    Delete(Vec<RecordId>),
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_report(&self, text: &str) -> Result<ReportId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("insert_report"))?;
        state.next_report_id = state.next_report_id.saturating_add(1);
        let id = ReportId(state.next_report_id);
        state.reports.insert(id, text.to_owned());
        Ok(id)
    }

    /// Store a record under a fresh id, keeping its count and checked flag.
    pub fn insert_record(&self, record: DisasterEventRecord) -> Result<RecordId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("insert_record"))?;
        state.next_record_id = state.next_record_id.saturating_add(1);
        let id = RecordId(state.next_record_id);
        state.records.insert(id, DisasterEventRecord { id, ..record });
        Ok(id)
    }

    /// Snapshot of committed records, ascending by id.
    pub fn records(&self) -> Result<Vec<DisasterEventRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("records"))?;
        Ok(state.records.values().cloned().collect())
    }

    pub fn report_ids(&self) -> Result<Vec<ReportId>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("report_ids"))?;
        Ok(state.reports.keys().copied().collect())
    }

    /// Make every later `update_merged` on `id` fail. Used to exercise rollback.
    pub fn fail_updates_on(&self, id: RecordId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("fail_updates_on"))?;
        state.failing_updates.insert(id);
        Ok(())
    }
}

pub struct InMemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    working: BTreeMap<RecordId, DisasterEventRecord>,
    failing_updates: HashSet<RecordId>,
    writes: Vec<StagedWrite>,
}

#[async_trait]
impl RecordStore for InMemoryStorage {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("begin"))?;
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            working: state.records.clone(),
            failing_updates: state.failing_updates.clone(),
            writes: Vec::new(),
        }))
    }
}

fn apply(records: &mut BTreeMap<RecordId, DisasterEventRecord>, write: &StagedWrite) -> u64 {
    match write {
        StagedWrite::MarkChecked(ids) => {
            let mut touched = 0;
            for id in ids {
                if let Some(record) = records.get_mut(id) {
                    record.checked = true;
                    touched += 1;
                }
            }
            touched
        },
        StagedWrite::Update(id, fields) => match records.get_mut(id) {
            Some(record) => {
                record.owning_report_id = fields.owning_report_id;
                record.time.clone_from(&fields.time);
                record.location.clone_from(&fields.location);
                record.event_type.clone_from(&fields.event_type);
                record.severity.clone_from(&fields.severity);
                record.report_count = fields.report_count;
                1
            },
            None => 0,
        },
        StagedWrite::Delete(ids) => {
            ids.iter().filter(|id| records.remove(*id).is_some()).count() as u64
        },
    }
}

impl InMemoryTransaction {
    fn stage(&mut self, write: StagedWrite) -> u64 {
        let touched = apply(&mut self.working, &write);
        self.writes.push(write);
        touched
    }
}

#[async_trait]
impl RecordTransaction for InMemoryTransaction {
    async fn fetch_all(&mut self) -> Result<Vec<DisasterEventRecord>, StorageError> {
        Ok(self.working.values().cloned().collect())
    }

    async fn fetch_by_ids(
        &mut self,
        ids: &[RecordId],
    ) -> Result<Vec<DisasterEventRecord>, StorageError> {
        let wanted: BTreeSet<RecordId> = ids.iter().copied().collect();
        Ok(wanted.iter().filter_map(|id| self.working.get(id).cloned()).collect())
    }

    async fn mark_checked(&mut self, ids: &[RecordId]) -> Result<u64, StorageError> {
        Ok(self.stage(StagedWrite::MarkChecked(ids.to_vec())))
    }

    async fn update_merged(
        &mut self,
        id: RecordId,
        fields: &MergedFields,
    ) -> Result<(), StorageError> {
        if self.failing_updates.contains(&id) {
            return Err(StorageError::Transaction(format!("injected update failure for {id}")));
        }
        if !self.working.contains_key(&id) {
            return Err(StorageError::NotFound { entity: "disaster_info", id: id.to_string() });
        }
        // same bound as the INT column
        if i32::try_from(fields.report_count).is_err() {
            return Err(StorageError::DataCorruption(format!(
                "report_count {} exceeds the INT column range",
                fields.report_count
            )));
        }
        self.stage(StagedWrite::Update(id, fields.clone()));
        Ok(())
    }

    async fn delete_records(&mut self, ids: &[RecordId]) -> Result<u64, StorageError> {
        Ok(self.stage(StagedWrite::Delete(ids.to_vec())))
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("commit"))?;
        for write in &self.writes {
            apply(&mut state.records, write);
        }
        Ok(())
    }
}

#[async_trait]
impl DedupLogStore for InMemoryStorage {
    async fn save_dedup_log(&self, summary: &DedupRunSummary) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("save_dedup_log"))?;
        state.dedup_logs.push(summary.clone());
        Ok(())
    }

    async fn list_dedup_logs(&self, limit: usize) -> Result<Vec<DedupRunSummary>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("list_dedup_logs"))?;
        let mut logs = state.dedup_logs.clone();
        // newest first, ties by insertion order
        logs.sort_by_key(|log| log.run_at);
        logs.reverse();
        logs.truncate(limit);
        Ok(logs)
    }
}

#[async_trait]
impl ReportStore for InMemoryStorage {
    async fn delete_orphan_reports(&self) -> Result<u64, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("delete_orphan_reports"))?;
        let owned: HashSet<ReportId> =
            state.records.values().filter_map(|r| r.owning_report_id).collect();
        let before = state.reports.len();
        state.reports.retain(|id, _| owned.contains(id));
        Ok((before - state.reports.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn seeded() -> (InMemoryStorage, RecordId, RecordId) {
        let storage = InMemoryStorage::new();
        let report = storage.insert_report("flood downtown").unwrap();
        let a = storage
            .insert_record(DisasterEventRecord::new(0, Some(report), "May 1", "Town", "flood", "x"))
            .unwrap();
        let b = storage
            .insert_record(DisasterEventRecord::new(0, Some(report), "May 2", "City", "flood", "y"))
            .unwrap();
        (storage, a, b)
    }

    fn merged(count: u32) -> MergedFields {
        MergedFields {
            owning_report_id: None,
            time: "t".to_owned(),
            location: "l".to_owned(),
            event_type: "e".to_owned(),
            severity: "s".to_owned(),
            report_count: count,
        }
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let (storage, a, b) = seeded();
        let mut tx = storage.begin().await.unwrap();
        assert_eq!(tx.mark_checked(&[a, b]).await.unwrap(), 2);
        assert_eq!(tx.delete_records(&[b]).await.unwrap(), 1);

        assert_eq!(tx.fetch_all().await.unwrap().len(), 1, "own writes visible inside tx");
        assert!(storage.records().unwrap().iter().all(|r| !r.checked));

        tx.commit().await.unwrap();
        let records = storage.records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].checked);
    }

    #[tokio::test]
    async fn dropping_transaction_rolls_back() {
        let (storage, a, _) = seeded();
        {
            let mut tx = storage.begin().await.unwrap();
            tx.update_merged(a, &merged(5)).await.unwrap();
        }
        let record = storage.records().unwrap().into_iter().find(|r| r.id == a).unwrap();
        assert_eq!(record.report_count, 1);
        assert_eq!(record.time, "May 1");
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let (storage, _, _) = seeded();
        let mut tx = storage.begin().await.unwrap();
        let err = tx.update_merged(RecordId(999), &merged(2)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_rejects_count_past_int_range() {
        let (storage, a, _) = seeded();
        let mut tx = storage.begin().await.unwrap();
        let err = tx.update_merged(a, &merged(u32::MAX)).await.unwrap_err();
        assert!(matches!(err, StorageError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn injected_update_failure() {
        let (storage, a, _) = seeded();
        storage.fail_updates_on(a).unwrap();
        let mut tx = storage.begin().await.unwrap();
        assert!(tx.update_merged(a, &merged(2)).await.is_err());
    }

    #[tokio::test]
    async fn fetch_by_ids_sorted_and_skips_missing() {
        let (storage, a, b) = seeded();
        let mut tx = storage.begin().await.unwrap();
        let rows = tx.fetch_by_ids(&[b, RecordId(42), a]).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn orphan_reports_are_deleted() {
        let (storage, a, b) = seeded();
        let lonely = storage.insert_report("nothing extracted").unwrap();
        assert_eq!(storage.delete_orphan_reports().await.unwrap(), 1);
        assert!(!storage.report_ids().unwrap().contains(&lonely));

        let mut tx = storage.begin().await.unwrap();
        tx.delete_records(&[a, b]).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(storage.delete_orphan_reports().await.unwrap(), 1);
        assert!(storage.report_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dedup_logs_newest_first() {
        let storage = InMemoryStorage::new();
        let now = Utc::now();
        for (offset, merged_clusters) in [(2, 0), (0, 2), (1, 1)] {
            storage
                .save_dedup_log(&DedupRunSummary {
                    run_id: Uuid::new_v4(),
                    run_at: now - Duration::minutes(offset),
                    duplicates_detected: merged_clusters,
                    merged_clusters,
                    deleted_records: merged_clusters,
                })
                .await
                .unwrap();
        }
        let logs = storage.list_dedup_logs(2).await.unwrap();
        let clusters: Vec<_> = logs.iter().map(|l| l.merged_clusters).collect();
        assert_eq!(clusters, vec![2, 1]);
    }
}
