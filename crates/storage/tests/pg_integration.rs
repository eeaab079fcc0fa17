//! Integration tests for PgStorage.
//! Run with: DATABASE_URL=... cargo test -p disaster-dedup-storage -- --ignored pg_

#![allow(clippy::unwrap_used, reason = "integration test code")]

use chrono::Utc;
use disaster_dedup_core::{DedupRunSummary, DisasterEventRecord, MergedFields, RecordId};
use disaster_dedup_storage::{
    DedupLogStore, PgStorage, RecordStore, RecordTransaction, ReportStore,
};
use uuid::Uuid;

async fn create_pg_storage() -> PgStorage {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgStorage integration tests");
    PgStorage::new(&url).await.expect("Failed to connect to PostgreSQL")
}

async fn seed(storage: &PgStorage, location: &str) -> (RecordId, RecordId) {
    let report = storage.insert_report(&format!("report-{}", Uuid::new_v4())).await.unwrap();
    let a = storage
        .insert_record(&DisasterEventRecord::new(0, Some(report), "May 1", location, "flood", "x"))
        .await
        .unwrap();
    let b = storage
        .insert_record(&DisasterEventRecord::new(0, Some(report), "May 1", location, "flood", "y"))
        .await
        .unwrap();
    (a, b)
}

#[tokio::test]
#[ignore]
async fn pg_insert_and_fetch_by_ids() {
    let storage = create_pg_storage().await;
    let location = format!("loc-{}", Uuid::new_v4());
    let (a, b) = seed(&storage, &location).await;

    let mut tx = storage.begin().await.unwrap();
    let rows = tx.fetch_by_ids(&[b, a]).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![a, b]);
    assert!(rows.iter().all(|r| r.report_count == 1 && !r.checked));
    assert_eq!(rows[0].location, location);
}

#[tokio::test]
#[ignore]
async fn pg_rollback_on_drop() {
    let storage = create_pg_storage().await;
    let (a, b) = seed(&storage, "rollback").await;

    {
        let mut tx = storage.begin().await.unwrap();
        assert_eq!(tx.mark_checked(&[a, b]).await.unwrap(), 2);
        assert_eq!(tx.delete_records(&[b]).await.unwrap(), 1);
    }

    let mut tx = storage.begin().await.unwrap();
    let rows = tx.fetch_by_ids(&[a, b]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| !r.checked));
}

#[tokio::test]
#[ignore]
async fn pg_merge_commit_and_orphan_cleanup() {
    let storage = create_pg_storage().await;
    let (a, b) = seed(&storage, "merge").await;

    let mut tx = storage.begin().await.unwrap();
    let survivor = tx.fetch_by_ids(&[a]).await.unwrap().remove(0);
    let fields = MergedFields {
        owning_report_id: survivor.owning_report_id,
        time: "May 1st".to_owned(),
        location: "merge".to_owned(),
        event_type: "flood".to_owned(),
        severity: "x; y".to_owned(),
        report_count: 2,
    };
    tx.update_merged(a, &fields).await.unwrap();
    tx.delete_records(&[b]).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin().await.unwrap();
    let rows = tx.fetch_by_ids(&[a, b]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].report_count, 2);
    assert_eq!(rows[0].severity, "x; y");
    drop(tx);

    // the report still owns `a`
    storage.delete_orphan_reports().await.unwrap();
    let mut tx = storage.begin().await.unwrap();
    assert_eq!(tx.fetch_by_ids(&[a]).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn pg_update_missing_record_is_not_found() {
    let storage = create_pg_storage().await;
    let mut tx = storage.begin().await.unwrap();
    let fields = MergedFields {
        owning_report_id: None,
        time: String::new(),
        location: String::new(),
        event_type: String::new(),
        severity: String::new(),
        report_count: 1,
    };
    let err = tx.update_merged(RecordId(i64::MAX), &fields).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore]
async fn pg_dedup_log_round_trip() {
    let storage = create_pg_storage().await;
    let summary = DedupRunSummary {
        run_id: Uuid::new_v4(),
        run_at: Utc::now(),
        duplicates_detected: 3,
        merged_clusters: 1,
        deleted_records: 2,
    };
    storage.save_dedup_log(&summary).await.unwrap();

    let logs = storage.list_dedup_logs(50).await.unwrap();
    let found = logs.iter().find(|l| l.run_id == summary.run_id).unwrap();
    assert_eq!(found.duplicates_detected, 3);
    assert_eq!(found.merged_clusters, 1);
    assert_eq!(found.deleted_records, 2);
}
