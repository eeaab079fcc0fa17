//! Bring the PostgreSQL schema up to date.
//!
//! Idempotent: every statement is `CREATE ... IF NOT EXISTS`.

use disaster_dedup_storage::PgStorage;

pub(crate) async fn run() -> anyhow::Result<()> {
    let database_url = crate::get_database_url()?;
    PgStorage::new(&database_url).await?;
    println!("Schema is up to date.");
    Ok(())
}
