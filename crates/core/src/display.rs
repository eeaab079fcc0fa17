//! Human-readable `report.sequence` labels used in merge audit output.

use std::collections::{BTreeMap, HashMap};

use crate::{DisasterEventRecord, RecordId, ReportId};

/// Label used in place of the report number for records without a report.
pub const UNASSIGNED_REPORT_LABEL: &str = "none";

/// Display ids for a snapshot of the record table.
///
/// The sequence is the 1-based position of a record among its report's
/// records ordered by id.
#[derive(Debug, Default, Clone)]
pub struct DisplayIds {
    labels: HashMap<RecordId, String>,
}

impl DisplayIds {
    #[must_use]
    pub fn from_records(records: &[DisasterEventRecord]) -> Self {
        let mut by_report: BTreeMap<Option<ReportId>, Vec<RecordId>> = BTreeMap::new();
        for record in records {
            by_report.entry(record.owning_report_id).or_default().push(record.id);
        }

        let mut labels = HashMap::with_capacity(records.len());
        for (report, mut ids) in by_report {
            ids.sort_unstable();
            let prefix = report.map_or_else(|| UNASSIGNED_REPORT_LABEL.to_owned(), |r| r.to_string());
            for (idx, id) in ids.into_iter().enumerate() {
                labels.insert(id, format!("{prefix}.{}", idx.saturating_add(1)));
            }
        }
        Self { labels }
    }

    /// Label for `id`; ids missing from the snapshot fall back to `#<id>`.
    #[must_use]
    pub fn label(&self, id: RecordId) -> String {
        self.labels.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
    }
}
