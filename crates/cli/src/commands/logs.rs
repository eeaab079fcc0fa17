use disaster_dedup_core::MAX_LOG_LIMIT;
use disaster_dedup_storage::{DedupLogStore, PgStorage};

pub(crate) async fn run(limit: usize) -> anyhow::Result<()> {
    let limit = limit.clamp(1, MAX_LOG_LIMIT);
    let database_url = crate::get_database_url()?;
    let storage = PgStorage::new(&database_url).await?;
    let logs = storage.list_dedup_logs(limit).await?;
    println!("{}", serde_json::to_string_pretty(&logs)?);
    Ok(())
}
