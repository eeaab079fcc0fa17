//! Applies cluster merges inside an open record transaction.

use std::sync::Arc;

use disaster_dedup_core::{
    ClusterDetail, DisplayIds, RecordId, SeverityMerge, compute_cluster_merge,
    fallback_severity_join,
};
use disaster_dedup_storage::RecordTransaction;

use crate::ServiceError;
use crate::ports::LevelNarrator;

/// Totals for one merge phase.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub merged_clusters: usize,
    pub deleted_records: usize,
    pub details: Vec<ClusterDetail>,
}

pub struct ClusterMerger {
    narrator: Arc<dyn LevelNarrator>,
}

impl ClusterMerger {
    #[must_use]
    pub fn new(narrator: Arc<dyn LevelNarrator>) -> Self {
        Self { narrator }
    }

    /// Merge every cluster of two or more live records.
    ///
    /// Writes go through `tx`; nothing is committed here.
    ///
    /// # Errors
    /// Any storage failure aborts the phase. The caller drops the transaction.
    pub async fn merge_clusters(
        &self,
        tx: &mut dyn RecordTransaction,
        clusters: &[Vec<RecordId>],
        display: &DisplayIds,
    ) -> Result<MergeReport, ServiceError> {
        let mut report = MergeReport::default();
        for cluster in clusters {
            let Some(detail) = self.merge_cluster(tx, cluster, display).await? else {
                continue;
            };
            report.merged_clusters = report.merged_clusters.saturating_add(1);
            report.deleted_records = report.deleted_records.saturating_add(detail.absorbed_ids.len());
            report.details.push(detail);
        }
        Ok(report)
    }

    async fn merge_cluster(
        &self,
        tx: &mut dyn RecordTransaction,
        cluster: &[RecordId],
        display: &DisplayIds,
    ) -> Result<Option<ClusterDetail>, ServiceError> {
        if cluster.len() <= 1 {
            return Ok(None);
        }
        let members = tx.fetch_by_ids(cluster).await?;
        let Some(plan) = compute_cluster_merge(&members) else {
            tracing::debug!(requested = cluster.len(), found = members.len(), "cluster skipped");
            return Ok(None);
        };

        let severity = self.resolve_severity(&plan.severity).await;
        let survivor_id = plan.survivor_id;
        let absorbed_ids = plan.absorbed_ids.clone();
        let fields = plan.into_fields(severity);

        tx.update_merged(survivor_id, &fields).await?;
        let deleted = tx.delete_records(&absorbed_ids).await?;
        tracing::debug!(
            survivor = %survivor_id,
            absorbed = absorbed_ids.len(),
            deleted,
            report_count = fields.report_count,
            "cluster merged"
        );

        Ok(Some(ClusterDetail {
            survivor_id,
            main_display_id: display.label(survivor_id),
            merged_display_ids: absorbed_ids.iter().map(|id| display.label(*id)).collect(),
            absorbed_ids,
        }))
    }

    async fn resolve_severity(&self, severity: &SeverityMerge) -> String {
        let texts = match severity {
            SeverityMerge::Uniform(text) => return text.clone(),
            SeverityMerge::NeedsCombination(texts) => texts,
        };
        match self.narrator.combine(texts).await {
            Ok(combined) if !combined.trim().is_empty() => combined.trim().to_owned(),
            Ok(_) => {
                tracing::warn!(inputs = texts.len(), "severity narrator returned nothing, joining");
                fallback_severity_join(texts)
            },
            Err(e) => {
                tracing::warn!(inputs = texts.len(), error = %e, "severity narrator failed, joining");
                fallback_severity_join(texts)
            },
        }
    }
}
