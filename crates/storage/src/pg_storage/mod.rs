//! PostgreSQL storage backend using sqlx.

mod audit;
mod records;

use std::time::Duration;

use disaster_dedup_core::{
    DisasterEventRecord, PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS,
    PG_POOL_MAX_CONNECTIONS, RecordId, ReportId,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::StorageError;

use super::pg_migrations::run_pg_migrations;

pub use records::PgRecordTransaction;

const RECORD_COLUMNS: &str =
    "id, report_id, time, location, event, level, report_count, has_been_checked";

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connect and bring the schema up to date.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }

    /// Insert a source report and return its id.
    pub async fn insert_report(&self, text: &str) -> Result<ReportId, StorageError> {
        let id: i64 = sqlx::query_scalar("INSERT INTO reports (text) VALUES ($1) RETURNING id")
            .bind(text)
            .fetch_one(&self.pool)
            .await?;
        Ok(ReportId(id))
    }

    /// Insert an extracted record. The `id` and `checked` fields of the
    /// argument are ignored; new rows always start unchecked.
    pub async fn insert_record(
        &self,
        record: &DisasterEventRecord,
    ) -> Result<RecordId, StorageError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO disaster_infos (report_id, time, location, event, level, report_count)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(record.owning_report_id.map(|r| r.0))
        .bind(&record.time)
        .bind(&record.location)
        .bind(&record.event_type)
        .bind(&record.severity)
        .bind(count_to_i32(record.report_count)?)
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId(id))
    }
}

pub(crate) fn row_to_record(row: &PgRow) -> Result<DisasterEventRecord, StorageError> {
    let id: i64 = row.try_get("id")?;
    let raw_count: i32 = row.try_get("report_count")?;
    let report_count = u32::try_from(raw_count).ok().filter(|c| *c >= 1).ok_or_else(|| {
        StorageError::DataCorruption(format!("record {id} has report_count {raw_count}"))
    })?;

    Ok(DisasterEventRecord {
        id: RecordId(id),
        owning_report_id: row.try_get::<Option<i64>, _>("report_id")?.map(ReportId),
        time: text_or_empty(row, "time")?,
        location: text_or_empty(row, "location")?,
        event_type: text_or_empty(row, "event")?,
        severity: text_or_empty(row, "level")?,
        report_count,
        checked: row.try_get("has_been_checked")?,
    })
}

fn text_or_empty(row: &PgRow, column: &str) -> Result<String, StorageError> {
    Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
}

pub(crate) fn ids_to_i64(ids: &[RecordId]) -> Vec<i64> {
    ids.iter().map(|id| id.0).collect()
}

/// `report_count` is an `INT` column; larger sums are rejected, never clamped.
pub(crate) fn count_to_i32(count: u32) -> Result<i32, StorageError> {
    i32::try_from(count).map_err(|_| {
        StorageError::DataCorruption(format!("report_count {count} exceeds the INT column range"))
    })
}

/// Convert `usize` to `i64` for SQL binds, saturating on overflow.
pub(crate) fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_within_int_range_converts() {
        assert_eq!(count_to_i32(3).unwrap(), 3);
        assert_eq!(count_to_i32(i32::MAX as u32).unwrap(), i32::MAX);
    }

    #[test]
    fn count_past_int_range_is_rejected() {
        let err = count_to_i32(i32::MAX as u32 + 1).unwrap_err();
        assert!(matches!(err, StorageError::DataCorruption(_)));
    }
}
