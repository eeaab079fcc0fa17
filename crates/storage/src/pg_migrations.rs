//! PostgreSQL schema migrations for the dedup store.

use sqlx::PgPool;

/// Run all PostgreSQL migrations. Every statement is idempotent.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id BIGSERIAL PRIMARY KEY,
            text TEXT NOT NULL,
            summary TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS disaster_infos (
            id BIGSERIAL PRIMARY KEY,
            report_id BIGINT REFERENCES reports(id) ON DELETE CASCADE,
            time TEXT,
            location TEXT,
            event TEXT,
            level TEXT,
            report_count INTEGER NOT NULL DEFAULT 1,
            has_been_checked BOOLEAN NOT NULL DEFAULT FALSE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_infos_report ON disaster_infos (report_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_infos_unchecked ON disaster_infos (id) \
         WHERE has_been_checked = FALSE",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dedup_log (
            id BIGSERIAL PRIMARY KEY,
            run_id UUID NOT NULL,
            run_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            duplicates_detected BIGINT NOT NULL,
            merged_clusters BIGINT NOT NULL,
            deleted_records BIGINT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dedup_log_run_at ON dedup_log (run_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
