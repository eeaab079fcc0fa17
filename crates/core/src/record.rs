//! Disaster-event records as stored in the `disaster_infos` table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a disaster-event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

/// Primary key of the report a record was extracted from.
///
/// Kept distinct from [`RecordId`] so the two can't be swapped at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ReportId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One structured observation of a disaster event.
///
/// Text fields are never `None`: NULL columns are read back as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterEventRecord {
    pub id: RecordId,
    pub owning_report_id: Option<ReportId>,
    pub time: String,
    pub location: String,
    pub event_type: String,
    pub severity: String,
    /// Number of observations aggregated into this record (>= 1).
    pub report_count: u32,
    /// Set once a dedup run has evaluated this record as "new". Never reset.
    pub checked: bool,
}

impl DisasterEventRecord {
    /// A freshly extracted record: `report_count = 1`, `checked = false`.
    #[must_use]
    pub fn new(
        id: i64,
        owning_report_id: Option<ReportId>,
        time: impl Into<String>,
        location: impl Into<String>,
        event_type: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId(id),
            owning_report_id,
            time: time.into(),
            location: location.into(),
            event_type: event_type.into(),
            severity: severity.into(),
            report_count: 1,
            checked: false,
        }
    }

    #[must_use]
    pub const fn with_report_count(mut self, report_count: u32) -> Self {
        self.report_count = report_count;
        self
    }

    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Rendering handed to the semantic oracle.
    #[must_use]
    pub fn oracle_text(&self) -> String {
        format!(
            "time:{}, location:{}, event:{}, severity:{}",
            self.time, self.location, self.event_type, self.severity
        )
    }

    /// The four embedded fields, in composition order.
    #[must_use]
    pub fn text_fields(&self) -> [&str; 4] {
        [self.time.as_str(), self.location.as_str(), self.event_type.as_str(), self.severity.as_str()]
    }
}
