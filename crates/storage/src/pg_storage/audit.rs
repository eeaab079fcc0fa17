//! DedupLogStore and ReportStore implementations for PgStorage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use disaster_dedup_core::DedupRunSummary;
use sqlx::Row;
use uuid::Uuid;

use super::{PgStorage, usize_to_i64};
use crate::error::StorageError;
use crate::traits::{DedupLogStore, ReportStore};

fn i64_to_count(val: i64) -> usize {
    usize::try_from(val).unwrap_or(0)
}

#[async_trait]
impl DedupLogStore for PgStorage {
    async fn save_dedup_log(&self, summary: &DedupRunSummary) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO dedup_log (run_id, run_at, duplicates_detected, merged_clusters,
                                    deleted_records)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(summary.run_id)
        .bind(summary.run_at)
        .bind(usize_to_i64(summary.duplicates_detected))
        .bind(usize_to_i64(summary.merged_clusters))
        .bind(usize_to_i64(summary.deleted_records))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_dedup_logs(&self, limit: usize) -> Result<Vec<DedupRunSummary>, StorageError> {
        let rows = sqlx::query(
            "SELECT run_id, run_at, duplicates_detected, merged_clusters, deleted_records
             FROM dedup_log ORDER BY run_at DESC, id DESC LIMIT $1",
        )
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let run_id: Uuid = row.try_get("run_id")?;
                let run_at: DateTime<Utc> = row.try_get("run_at")?;
                Ok(DedupRunSummary {
                    run_id,
                    run_at,
                    duplicates_detected: i64_to_count(row.try_get("duplicates_detected")?),
                    merged_clusters: i64_to_count(row.try_get("merged_clusters")?),
                    deleted_records: i64_to_count(row.try_get("deleted_records")?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ReportStore for PgStorage {
    async fn delete_orphan_reports(&self) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "DELETE FROM reports r
             WHERE NOT EXISTS (SELECT 1 FROM disaster_infos d WHERE d.report_id = r.id)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
