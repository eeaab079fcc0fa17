//! One dedup run: detect pairs, flip `checked`, cluster, merge.
//!
//! Two commits per run by default: the `checked` flip is committed before
//! the merge phase opens its own transaction. A crash between the two leaves
//! records checked with their pairs lost; `single_transaction` closes that
//! gap by committing both phases together.

use std::sync::Arc;

use chrono::Utc;
use disaster_dedup_core::{ClusterBuilder, DedupConfig, DedupOutcome, DedupRunSummary, DisplayIds};
use disaster_dedup_embeddings::RecordEmbedder;
use disaster_dedup_storage::RecordStore;
use tracing::Instrument;
use uuid::Uuid;

use crate::ServiceError;
use crate::detector::SimilarityDetector;
use crate::embedding_cache::CachingRecordEmbedder;
use crate::merger::ClusterMerger;
use crate::ports::{LevelNarrator, SemanticOracle};

pub struct DedupService {
    store: Arc<dyn RecordStore>,
    detector: SimilarityDetector,
    merger: ClusterMerger,
    config: DedupConfig,
}

impl DedupService {
    /// Wire a service. When `config.embed_cache_max_entries > 0` the embedder
    /// is wrapped in a [`CachingRecordEmbedder`] that lives as long as the
    /// service.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn RecordEmbedder>,
        oracle: Arc<dyn SemanticOracle>,
        narrator: Arc<dyn LevelNarrator>,
        config: DedupConfig,
    ) -> Self {
        let config = config.normalized();
        let embedder: Arc<dyn RecordEmbedder> = if config.embed_cache_max_entries > 0 {
            Arc::new(CachingRecordEmbedder::new(embedder, config.embed_cache_max_entries))
        } else {
            embedder
        };
        Self {
            store,
            detector: SimilarityDetector::new(embedder, oracle, config),
            merger: ClusterMerger::new(narrator),
            config,
        }
    }

    /// Execute one full run.
    ///
    /// # Errors
    /// Embedding, storage and commit failures abort the run. The open
    /// transaction is dropped, so the table is left as of the last commit.
    pub async fn run(&self) -> Result<DedupOutcome, ServiceError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("dedup_run", %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    /// Audit-log row for a finished run, stamped now.
    #[must_use]
    pub fn summary(outcome: &DedupOutcome) -> DedupRunSummary {
        outcome.summary(Utc::now())
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<DedupOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;
        let records = tx.fetch_all().await?;
        let detection = self.detector.detect(&records).await?;
        tx.mark_checked(&detection.checked_ids).await?;

        let mut outcome = DedupOutcome::empty(run_id);
        outcome.checked_records = detection.checked_ids.len();
        outcome.pairs = detection.pairs;

        if !self.config.single_transaction {
            tx.commit().await?;
            tracing::debug!(checked = outcome.checked_records, "checked flags committed");
            tx = self.store.begin().await?;
        }

        if !outcome.pairs.is_empty() {
            let clusters = ClusterBuilder::from_pairs(&outcome.pairs).clusters();
            let snapshot = tx.fetch_all().await?;
            let display = DisplayIds::from_records(&snapshot);
            let report = self.merger.merge_clusters(tx.as_mut(), &clusters, &display).await?;
            outcome.merged_clusters = report.merged_clusters;
            outcome.deleted_records = report.deleted_records;
            outcome.cluster_details = report.details;
        }

        tx.commit().await?;
        tracing::info!(
            records = records.len(),
            checked = outcome.checked_records,
            pairs = outcome.pairs.len(),
            merged_clusters = outcome.merged_clusters,
            deleted_records = outcome.deleted_records,
            "dedup run completed"
        );
        Ok(outcome)
    }
}
