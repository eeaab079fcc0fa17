//! Pure merge computation for a cluster of duplicate records.
//!
//! The storage layer only applies the resulting values; severity texts that
//! disagree are handed back to the caller for combination since that step
//! needs a language model.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{DisasterEventRecord, RecordId, ReportId, SEVERITY_FALLBACK_SEPARATOR};

/// How the merged severity text is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeverityMerge {
    /// Every member carries the same text; keep it verbatim.
    Uniform(String),
    /// Members disagree. Distinct texts in first-seen order (members by id).
    NeedsCombination(Vec<String>),
}

/// Field values computed for one cluster, before severity is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub survivor_id: RecordId,
    /// Members deleted by the merge, ascending.
    pub absorbed_ids: Vec<RecordId>,
    pub owning_report_id: Option<ReportId>,
    pub time: String,
    pub location: String,
    pub event_type: String,
    pub severity: SeverityMerge,
    /// Sum of every member's pre-merge count.
    pub report_count: u32,
}

/// Values written onto the surviving record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedFields {
    pub owning_report_id: Option<ReportId>,
    pub time: String,
    pub location: String,
    pub event_type: String,
    pub severity: String,
    pub report_count: u32,
}

impl MergePlan {
    /// Finish the plan with the resolved severity text.
    #[must_use]
    pub fn into_fields(self, severity: String) -> MergedFields {
        MergedFields {
            owning_report_id: self.owning_report_id,
            time: self.time,
            location: self.location,
            event_type: self.event_type,
            severity,
            report_count: self.report_count,
        }
    }
}

/// Compute the merge for one cluster.
///
/// Returns `None` when fewer than two members are given.
///
/// # Merge rules
/// - **report_count**: sum over members
/// - **time / location**: longest text; ties go to the lexicographically smallest
/// - **event_type**: most frequent value; ties go to the longest, then smallest
/// - **severity**: identical texts kept verbatim, otherwise the distinct texts
///   are returned for combination
/// - **survivor**: highest pre-merge `report_count`, ties go to the smallest id
#[must_use]
pub fn compute_cluster_merge(members: &[DisasterEventRecord]) -> Option<MergePlan> {
    if members.len() <= 1 {
        return None;
    }

    let mut sorted: Vec<&DisasterEventRecord> = members.iter().collect();
    sorted.sort_by_key(|r| r.id);

    let survivor = sorted
        .iter()
        .copied()
        .max_by(|a, b| a.report_count.cmp(&b.report_count).then_with(|| b.id.cmp(&a.id)))?;

    let report_count =
        sorted.iter().fold(0_u32, |acc, r| acc.saturating_add(r.report_count));

    let time = choose_longest(sorted.iter().map(|r| r.time.as_str()));
    let location = choose_longest(sorted.iter().map(|r| r.location.as_str()));
    let event_type = choose_mode(sorted.iter().map(|r| r.event_type.as_str()));

    let distinct = distinct_in_order(sorted.iter().map(|r| r.severity.as_str()));
    let severity = match distinct.as_slice() {
        [only] => SeverityMerge::Uniform(only.clone()),
        _ => SeverityMerge::NeedsCombination(distinct),
    };

    let owning_report_id = survivor
        .owning_report_id
        .or_else(|| sorted.iter().find_map(|r| r.owning_report_id));

    let absorbed_ids =
        sorted.iter().map(|r| r.id).filter(|id| *id != survivor.id).collect();

    Some(MergePlan {
        survivor_id: survivor.id,
        absorbed_ids,
        owning_report_id,
        time,
        location,
        event_type,
        severity,
        report_count,
    })
}

/// Join distinct severity texts without a language model.
/// Order of first appearance is kept; only input text is used.
#[must_use]
pub fn fallback_severity_join(texts: &[String]) -> String {
    distinct_in_order(texts.iter().map(String::as_str)).join(SEVERITY_FALLBACK_SEPARATOR)
}

/// Longest value by character count; ties go to the lexicographically smallest.
#[must_use]
pub fn choose_longest<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut best: Option<(usize, &str)> = None;
    for value in values {
        let len = value.chars().count();
        let better = match best {
            None => true,
            Some((best_len, best_value)) => {
                len > best_len || (len == best_len && value < best_value)
            },
        };
        if better {
            best = Some((len, value));
        }
    }
    best.map(|(_, v)| v.to_owned()).unwrap_or_default()
}

/// Most frequent value; ties among equally frequent values go to [`choose_longest`].
#[must_use]
pub fn choose_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        let entry = counts.entry(value).or_insert(0);
        *entry = entry.saturating_add(1);
    }
    let Some(top) = counts.values().copied().max() else {
        return String::new();
    };
    choose_longest(counts.into_iter().filter(|(_, n)| *n == top).map(|(v, _)| v))
}

fn distinct_in_order<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Vec::new();
    for value in values {
        if seen.insert(value) {
            result.push(value.to_owned());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, report: Option<i64>, severity: &str) -> DisasterEventRecord {
        DisasterEventRecord::new(id, report.map(ReportId), "2024-09-15", "Zhuhai", "typhoon", severity)
    }

    #[test]
    fn single_member_yields_no_plan() {
        assert!(compute_cluster_merge(&[rec(1, Some(1), "a")]).is_none());
        assert!(compute_cluster_merge(&[]).is_none());
    }

    #[test]
    fn report_count_is_conserved() {
        let members = vec![
            rec(1, Some(1), "a").with_report_count(3),
            rec(2, Some(1), "a").with_report_count(1),
            rec(3, Some(2), "a").with_report_count(4),
        ];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(plan.report_count, 8);
    }

    #[test]
    fn survivor_has_highest_original_count() {
        let members = vec![
            rec(1, Some(1), "a").with_report_count(2),
            rec(5, Some(1), "a").with_report_count(7),
            rec(3, Some(1), "a").with_report_count(7),
        ];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(plan.survivor_id, RecordId(3));
        assert_eq!(plan.absorbed_ids, vec![RecordId(1), RecordId(5)]);
    }

    #[test]
    fn survivor_tie_goes_to_smallest_id() {
        let members = vec![rec(9, None, "a"), rec(4, None, "a"), rec(6, None, "a")];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(plan.survivor_id, RecordId(4));
        assert_eq!(plan.absorbed_ids.len(), members.len() - 1);
    }

    #[test]
    fn longest_wins_and_ties_are_lexicographic() {
        assert_eq!(choose_longest(["ab", "abcd", "xyz"]), "abcd");
        assert_eq!(choose_longest(["bbb", "aaa", "ccc"]), "aaa");
        assert_eq!(choose_longest(Vec::<&str>::new()), "");
    }

    #[test]
    fn longest_counts_characters_not_bytes() {
        // Three CJK characters are nine bytes but shorter than four ASCII letters.
        assert_eq!(choose_longest(["珠海市", "city"]), "city");
    }

    #[test]
    fn mode_then_longest() {
        assert_eq!(choose_mode(["flood", "typhoon", "flood"]), "flood");
        assert_eq!(choose_mode(["flood", "typhoon"]), "typhoon");
        assert_eq!(choose_mode(["rain", "snow"]), "rain");
    }

    #[test]
    fn uniform_severity_is_kept() {
        let plan = compute_cluster_merge(&[rec(1, None, "power cut"), rec(2, None, "power cut")]).unwrap();
        assert_eq!(plan.severity, SeverityMerge::Uniform("power cut".to_owned()));
    }

    #[test]
    fn differing_severities_listed_in_first_seen_order() {
        let members = vec![rec(3, None, "B"), rec(1, None, "A"), rec(2, None, "A")];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(
            plan.severity,
            SeverityMerge::NeedsCombination(vec!["A".to_owned(), "B".to_owned()])
        );
    }

    #[test]
    fn fallback_join_uses_only_inputs() {
        let texts = vec!["A".to_owned(), "B".to_owned(), "A".to_owned()];
        assert_eq!(fallback_severity_join(&texts), "A; B");
    }

    #[test]
    fn survivor_inherits_missing_report() {
        let members = vec![
            rec(1, None, "a").with_report_count(5),
            rec(2, Some(8), "a"),
            rec(3, Some(9), "a"),
        ];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(plan.survivor_id, RecordId(1));
        assert_eq!(plan.owning_report_id, Some(ReportId(8)));
    }

    #[test]
    fn survivor_keeps_own_report() {
        let members = vec![rec(1, Some(4), "a").with_report_count(2), rec(2, Some(8), "a")];
        let plan = compute_cluster_merge(&members).unwrap();
        assert_eq!(plan.owning_report_id, Some(ReportId(4)));
    }

    #[test]
    fn into_fields_carries_plan_values() {
        let members = vec![rec(1, Some(1), "A"), rec(2, Some(1), "B")];
        let plan = compute_cluster_merge(&members).unwrap();
        let fields = plan.into_fields("A and B".to_owned());
        assert_eq!(fields.severity, "A and B");
        assert_eq!(fields.report_count, 2);
        assert_eq!(fields.location, "Zhuhai");
    }
}
