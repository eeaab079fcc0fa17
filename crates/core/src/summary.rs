//! Results of one dedup run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RecordId, SimilarityPair};

/// Audit detail for one merged cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetail {
    pub survivor_id: RecordId,
    pub absorbed_ids: Vec<RecordId>,
    pub main_display_id: String,
    pub merged_display_ids: Vec<String>,
}

/// Everything a caller learns from a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupOutcome {
    pub run_id: Uuid,
    pub pairs: Vec<SimilarityPair>,
    pub merged_clusters: usize,
    pub deleted_records: usize,
    /// Records flipped to `checked = true` by this run.
    pub checked_records: usize,
    pub cluster_details: Vec<ClusterDetail>,
}

impl DedupOutcome {
    #[must_use]
    pub fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            pairs: Vec::new(),
            merged_clusters: 0,
            deleted_records: 0,
            checked_records: 0,
            cluster_details: Vec::new(),
        }
    }

    #[must_use]
    pub fn duplicates_detected(&self) -> usize {
        self.pairs.len()
    }

    /// Summary row for the dedup audit log.
    #[must_use]
    pub fn summary(&self, run_at: DateTime<Utc>) -> DedupRunSummary {
        DedupRunSummary {
            run_id: self.run_id,
            run_at,
            duplicates_detected: self.duplicates_detected(),
            merged_clusters: self.merged_clusters,
            deleted_records: self.deleted_records,
        }
    }
}

/// One row of the dedup audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRunSummary {
    pub run_id: Uuid,
    pub run_at: DateTime<Utc>,
    pub duplicates_detected: usize,
    pub merged_clusters: usize,
    pub deleted_records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_pairs() {
        let mut outcome = DedupOutcome::empty(Uuid::new_v4());
        outcome.pairs.push(SimilarityPair::new(RecordId(1), RecordId(2)).unwrap());
        outcome.merged_clusters = 1;
        outcome.deleted_records = 1;
        let now = Utc::now();
        let summary = outcome.summary(now);
        assert_eq!(summary.duplicates_detected, 1);
        assert_eq!(summary.run_id, outcome.run_id);
        assert_eq!(summary.run_at, now);
    }
}
