//! One dedup run followed by audit logging and orphan-report cleanup.

use std::sync::Arc;

use disaster_dedup_core::{ClusterDetail, DedupConfig, SimilarityPair};
use disaster_dedup_embeddings::{EmbeddingService, WeightedFieldEmbedder};
use disaster_dedup_llm::LlmClient;
use disaster_dedup_service::DedupService;
use disaster_dedup_storage::{DedupLogStore, PgStorage, ReportStore};
use serde::Serialize;
use uuid::Uuid;

pub(crate) struct RunArgs {
    pub duplicate_threshold: Option<f32>,
    pub fuzzy_floor: Option<f32>,
    pub single_transaction: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    run_id: Uuid,
    duplicates_detected: usize,
    merged_clusters: usize,
    deleted_records: usize,
    checked_records: usize,
    orphan_reports_deleted: u64,
    pairs: &'a [SimilarityPair],
    cluster_details: &'a [ClusterDetail],
}

/// Env-derived config with command-line overrides on top.
fn resolve_config(args: &RunArgs) -> DedupConfig {
    let mut config = DedupConfig::from_env();
    if let Some(threshold) = args.duplicate_threshold {
        config.duplicate_threshold = threshold;
    }
    if let Some(floor) = args.fuzzy_floor {
        config.fuzzy_floor = floor;
    }
    if args.single_transaction {
        config.single_transaction = true;
    }
    config.normalized()
}

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args);
    let database_url = crate::get_database_url()?;
    let storage = Arc::new(PgStorage::new(&database_url).await?);
    let llm = Arc::new(LlmClient::new(crate::get_api_key()?, crate::get_base_url())?);

    // model load reads weights from disk
    let provider = tokio::task::spawn_blocking(EmbeddingService::new).await??;
    let embedder = Arc::new(WeightedFieldEmbedder::new(Arc::new(provider)));

    tracing::info!(
        duplicate_threshold = config.duplicate_threshold,
        fuzzy_floor = config.fuzzy_floor,
        single_transaction = config.single_transaction,
        model = llm.model(),
        "starting dedup run"
    );
    let service = DedupService::new(storage.clone(), embedder, llm.clone(), llm, config);
    let outcome = service.run().await?;

    storage.save_dedup_log(&DedupService::summary(&outcome)).await?;
    let orphan_reports_deleted = storage.delete_orphan_reports().await?;
    if orphan_reports_deleted > 0 {
        tracing::info!(count = orphan_reports_deleted, "deleted reports without records");
    }

    let report = RunReport {
        run_id: outcome.run_id,
        duplicates_detected: outcome.duplicates_detected(),
        merged_clusters: outcome.merged_clusters,
        deleted_records: outcome.deleted_records,
        checked_records: outcome.checked_records,
        orphan_reports_deleted,
        pairs: &outcome.pairs,
        cluster_details: &outcome.cluster_details,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_defaults() {
        let args = RunArgs {
            duplicate_threshold: Some(0.8),
            fuzzy_floor: Some(0.95),
            single_transaction: true,
        };
        let config = resolve_config(&args);
        assert!((config.duplicate_threshold - 0.8).abs() < f32::EPSILON);
        assert!((config.fuzzy_floor - 0.8).abs() < f32::EPSILON, "floor clamped to threshold");
        assert!(config.single_transaction);
    }
}
