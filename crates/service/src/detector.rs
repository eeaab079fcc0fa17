//! Duplicate-pair detection over the full record table.
//!
//! Unchecked records are compared against each other and then against the
//! already-checked history, each time through a top-k inner-product search.
//! Scores in the fuzzy band are settled by the semantic oracle.

use std::sync::Arc;

use disaster_dedup_core::{
    DedupConfig, DisasterEventRecord, NEIGHBOR_TOP_K, PairSet, RecordId, SimilarityPair,
    l2_normalize,
};
use disaster_dedup_embeddings::RecordEmbedder;

use crate::ServiceError;
use crate::ann::{AnnIndex, FlatIpIndex, Neighbor};
use crate::ports::SemanticOracle;

/// Result of one detection pass.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Accepted pairs in evaluation order.
    pub pairs: Vec<SimilarityPair>,
    /// Every record that was processed as new and must be flipped to checked.
    pub checked_ids: Vec<RecordId>,
    /// Distinct pairs classified, accepted or not.
    pub evaluated: usize,
}

pub struct SimilarityDetector {
    embedder: Arc<dyn RecordEmbedder>,
    oracle: Arc<dyn SemanticOracle>,
    config: DedupConfig,
}

/// Neighbor lists for each new record, one list per pass.
struct NeighborTable {
    new_vs_new: Vec<Vec<Neighbor>>,
    new_vs_historical: Vec<Vec<Neighbor>>,
}

impl SimilarityDetector {
    #[must_use]
    pub fn new(
        embedder: Arc<dyn RecordEmbedder>,
        oracle: Arc<dyn SemanticOracle>,
        config: DedupConfig,
    ) -> Self {
        Self { embedder, oracle, config: config.normalized() }
    }

    /// Find duplicate pairs among `records`.
    ///
    /// # Errors
    /// Embedding failures are fatal and abort detection with no partial
    /// result. Oracle failures are not errors; the pair is rejected.
    pub async fn detect(
        &self,
        records: &[DisasterEventRecord],
    ) -> Result<Detection, ServiceError> {
        let (mut new, mut historical): (Vec<_>, Vec<_>) =
            records.iter().cloned().partition(|r| !r.checked);
        new.sort_by_key(|r| r.id);
        historical.sort_by_key(|r| r.id);

        let checked_ids: Vec<RecordId> = new.iter().map(|r| r.id).collect();
        if new.is_empty() {
            tracing::debug!(historical = historical.len(), "no unchecked records");
            return Ok(Detection { checked_ids, ..Detection::default() });
        }

        let embedder = Arc::clone(&self.embedder);
        let new_for_task = new.clone();
        let historical_for_task = historical.clone();
        let table = tokio::task::spawn_blocking(move || {
            build_neighbor_table(embedder.as_ref(), &new_for_task, &historical_for_task)
        })
        .await
        .map_err(|e| ServiceError::System(anyhow::anyhow!("spawn_blocking failed: {e}")))??;

        let mut pairs = PairSet::new();
        for (query, neighbors) in new.iter().zip(&table.new_vs_new) {
            for neighbor in neighbors {
                let Some(j) = neighbor.index(new.len()) else { continue };
                self.classify(&mut pairs, query, &new[j], neighbor.score).await;
            }
        }
        for (query, neighbors) in new.iter().zip(&table.new_vs_historical) {
            for neighbor in neighbors {
                let Some(j) = neighbor.index(historical.len()) else { continue };
                self.classify(&mut pairs, query, &historical[j], neighbor.score).await;
            }
        }

        let evaluated = pairs.evaluated_count();
        let pairs = pairs.into_accepted();
        tracing::info!(
            new = new.len(),
            historical = historical.len(),
            evaluated,
            pairs = pairs.len(),
            "similarity detection completed"
        );
        Ok(Detection { pairs, checked_ids, evaluated })
    }

    async fn classify(
        &self,
        pairs: &mut PairSet,
        a: &DisasterEventRecord,
        b: &DisasterEventRecord,
        score: f32,
    ) {
        // self matches and equal ids produce no pair
        let Some(pair) = SimilarityPair::new(a.id, b.id) else { return };
        if !pairs.begin_evaluation(pair) {
            return;
        }

        if score >= self.config.duplicate_threshold {
            tracing::debug!(record_a = %a.id, record_b = %b.id, score, "pair accepted");
            pairs.accept(pair);
        } else if self.config.in_fuzzy_band(score) {
            match self.oracle.similar(&a.oracle_text(), &b.oracle_text()).await {
                Ok(true) => {
                    tracing::debug!(record_a = %a.id, record_b = %b.id, score, "pair accepted by oracle");
                    pairs.accept(pair);
                },
                Ok(false) => {
                    tracing::debug!(record_a = %a.id, record_b = %b.id, score, "pair rejected by oracle");
                },
                Err(e) => {
                    tracing::warn!(
                        record_a = %a.id,
                        record_b = %b.id,
                        score,
                        error = %e,
                        "similarity oracle failed, treating pair as distinct"
                    );
                },
            }
        } else {
            tracing::trace!(record_a = %a.id, record_b = %b.id, score, "below fuzzy floor");
        }
    }
}

fn embed_normalized(
    embedder: &dyn RecordEmbedder,
    records: &[DisasterEventRecord],
) -> Result<Vec<Vec<f32>>, ServiceError> {
    let mut vectors = embedder.embed_records(records)?;
    for v in &mut vectors {
        l2_normalize(v);
    }
    Ok(vectors)
}

fn build_neighbor_table(
    embedder: &dyn RecordEmbedder,
    new: &[DisasterEventRecord],
    historical: &[DisasterEventRecord],
) -> Result<NeighborTable, ServiceError> {
    let new_vectors = embed_normalized(embedder, new)?;
    let historical_vectors = embed_normalized(embedder, historical)?;

    let new_index = FlatIpIndex::from_vectors(new_vectors.clone())?;
    let new_vs_new = new_vectors.iter().map(|q| new_index.search(q, NEIGHBOR_TOP_K)).collect();

    let new_vs_historical = if historical_vectors.is_empty() {
        Vec::new()
    } else {
        let historical_index = FlatIpIndex::from_vectors(historical_vectors)?;
        if historical_index.dimension() != new_index.dimension() {
            return Err(disaster_dedup_core::Error::DimensionMismatch {
                expected: new_index.dimension(),
                actual: historical_index.dimension(),
            }
            .into());
        }
        new_vectors.iter().map(|q| historical_index.search(q, NEIGHBOR_TOP_K)).collect()
    };

    Ok(NeighborTable { new_vs_new, new_vs_historical })
}
