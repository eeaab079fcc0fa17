//! Record transactions for PgStorage.

use async_trait::async_trait;
use disaster_dedup_core::{DisasterEventRecord, MergedFields, RecordId};
use sqlx::{Postgres, Transaction};

use super::{PgStorage, RECORD_COLUMNS, count_to_i32, ids_to_i64, row_to_record};
use crate::error::StorageError;
use crate::traits::{RecordStore, RecordTransaction};

/// A live `BEGIN ... COMMIT` block. Dropped without commit, sqlx rolls it back.
pub struct PgRecordTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RecordStore for PgStorage {
    async fn begin(&self) -> Result<Box<dyn RecordTransaction>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRecordTransaction { tx }))
    }
}

#[async_trait]
impl RecordTransaction for PgRecordTransaction {
    async fn fetch_all(&mut self) -> Result<Vec<DisasterEventRecord>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM disaster_infos ORDER BY id"))
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn fetch_by_ids(
        &mut self,
        ids: &[RecordId],
    ) -> Result<Vec<DisasterEventRecord>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM disaster_infos WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids_to_i64(ids))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn mark_checked(&mut self, ids: &[RecordId]) -> Result<u64, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("UPDATE disaster_infos SET has_been_checked = TRUE WHERE id = ANY($1)")
                .bind(ids_to_i64(ids))
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected())
    }

    async fn update_merged(
        &mut self,
        id: RecordId,
        fields: &MergedFields,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE disaster_infos
             SET report_id = $1, time = $2, location = $3, event = $4, level = $5,
                 report_count = $6
             WHERE id = $7",
        )
        .bind(fields.owning_report_id.map(|r| r.0))
        .bind(&fields.time)
        .bind(&fields.location)
        .bind(&fields.event_type)
        .bind(&fields.severity)
        .bind(count_to_i32(fields.report_count)?)
        .bind(id.0)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "disaster_info", id: id.to_string() });
        }
        Ok(())
    }

    async fn delete_records(&mut self, ids: &[RecordId]) -> Result<u64, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM disaster_infos WHERE id = ANY($1)")
            .bind(ids_to_i64(ids))
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}
