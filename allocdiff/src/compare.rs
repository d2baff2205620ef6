//! Record-level diffing between two allocation record sets.
//!
//! Records join on [`AllocId`] alone. Within each bucket the output follows
//! the order of the corresponding input slice; nothing is sorted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rollup::{self, ActivityCountChange, EmployeeRollup};
use crate::types::{AllocId, AllocationRecord, RequestKey, TrackedField};

/// One tracked-field difference between two records sharing an identity.
/// `from` is the previous value, `to` the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: TrackedField,
    pub from: Value,
    pub to: Value,
}

/// A record present on both sides with at least one tracked-field change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedRecord {
    pub current: AllocationRecord,
    pub previous: AllocationRecord,
    pub changes: Vec<FieldChange>,
}

/// Partition of two record sets by identity and content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDiff {
    pub added: Vec<AllocationRecord>,
    pub removed: Vec<AllocationRecord>,
    pub modified: Vec<ModifiedRecord>,
    pub unchanged: Vec<AllocationRecord>,
}

/// Partition `current` against `previous`.
///
/// Every current record lands in exactly one of added/modified/unchanged and
/// every previous record in exactly one of removed/modified/unchanged, so the
/// bucket sizes always reconcile with the input lengths.
///
/// Caveat: duplicate ids within one side are not rejected; the identity map
/// keeps the last-seen record per id, so each duplicate occurrence is
/// compared against that record.
pub fn diff(current: &[AllocationRecord], previous: &[AllocationRecord]) -> RecordDiff {
    let current_ids: HashMap<&AllocId, &AllocationRecord> =
        current.iter().map(|record| (&record.alloc_no, record)).collect();
    let previous_ids: HashMap<&AllocId, &AllocationRecord> =
        previous.iter().map(|record| (&record.alloc_no, record)).collect();

    let mut result = RecordDiff::default();

    for record in current {
        match previous_ids.get(&record.alloc_no) {
            None => result.added.push(record.clone()),
            Some(previous_record) => {
                let changes = field_changes(record, previous_record);
                if changes.is_empty() {
                    result.unchanged.push(record.clone());
                } else {
                    result.modified.push(ModifiedRecord {
                        current: record.clone(),
                        previous: (*previous_record).clone(),
                        changes,
                    });
                }
            }
        }
    }

    for record in previous {
        if !current_ids.contains_key(&record.alloc_no) {
            result.removed.push(record.clone());
        }
    }

    result
}

/// Compare the fixed tracked-field list between two records, in field-list
/// order, under strict value equality. Empty result means "unchanged".
pub fn field_changes(current: &AllocationRecord, previous: &AllocationRecord) -> Vec<FieldChange> {
    TrackedField::ALL
        .iter()
        .copied()
        .filter_map(|field| {
            let from = previous.tracked_value(field);
            let to = current.tracked_value(field);
            (from != to).then(|| FieldChange { field, from, to })
        })
        .collect()
}

/// Top-level counts for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_current: usize,
    pub total_previous: usize,
    pub net_change: i64,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

/// The output of one diff operation: computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    pub details: RecordDiff,
    pub employee_changes: EmployeeRollup,
    pub activity_changes: Vec<ActivityCountChange>,
    pub request: RequestKey,
    pub timestamp: DateTime<Utc>,
}

/// Compare two record sets sharing the same request key.
///
/// Pure over its inputs apart from the timestamp: the caller supplies both
/// record sets and is responsible for storing the current one afterwards.
pub fn compare(
    current: &[AllocationRecord],
    previous: &[AllocationRecord],
    request: &RequestKey,
) -> Comparison {
    let details = diff(current, previous);
    let summary = ComparisonSummary {
        total_current: current.len(),
        total_previous: previous.len(),
        net_change: current.len() as i64 - previous.len() as i64,
        added: details.added.len(),
        removed: details.removed.len(),
        modified: details.modified.len(),
        unchanged: details.unchanged.len(),
    };

    Comparison {
        summary,
        employee_changes: rollup::employee_changes(current, previous),
        activity_changes: rollup::activity_changes(current, previous),
        details,
        request: request.clone(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_record(alloc_no: i64, percent: f64) -> AllocationRecord {
        AllocationRecord::new(alloc_no)
            .with_employee(format!("E{alloc_no}"), format!("Employee {alloc_no}"))
            .with_dates("2025-01-01", "2025-03-31")
            .with_percent(percent)
            .with_activity("Development")
    }

    fn request() -> RequestKey {
        RequestKey::new("P1", "2025-01-01", "2025-03-31", "ada")
    }

    #[test]
    fn partitions_added_removed_modified() {
        // Record 1 changes percent, record 2 is new, record 3 disappears.
        let current = vec![make_record(1, 50.0), make_record(2, 20.0)];
        let previous = vec![make_record(1, 40.0), make_record(3, 30.0)];

        let result = diff(&current, &previous);

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].alloc_no, AllocId::from(2));
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].alloc_no, AllocId::from(3));
        assert_eq!(result.modified.len(), 1);
        assert!(result.unchanged.is_empty());

        let changes = &result.modified[0].changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, TrackedField::Percent);
        assert_eq!(changes[0].from, json!(40.0));
        assert_eq!(changes[0].to, json!(50.0));
    }

    #[test]
    fn partition_sizes_reconcile_with_inputs() {
        let current = vec![
            make_record(1, 50.0),
            make_record(2, 20.0),
            make_record(4, 10.0),
        ];
        let previous = vec![make_record(1, 40.0), make_record(3, 30.0), make_record(4, 10.0)];

        let result = diff(&current, &previous);
        assert_eq!(
            result.added.len() + result.modified.len() + result.unchanged.len(),
            current.len()
        );
        assert_eq!(
            result.removed.len() + result.modified.len() + result.unchanged.len(),
            previous.len()
        );
    }

    #[test]
    fn identical_sets_are_all_unchanged() {
        let records = vec![make_record(1, 50.0), make_record(2, 20.0)];
        let result = diff(&records, &records);

        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
        assert!(result.modified.is_empty());
        assert_eq!(result.unchanged.len(), records.len());
    }

    #[test]
    fn empty_previous_marks_everything_added() {
        let current = vec![make_record(1, 50.0), make_record(2, 20.0)];
        let result = diff(&current, &[]);

        assert_eq!(result.added.len(), 2);
        assert!(result.removed.is_empty());
        assert!(result.modified.is_empty());
        assert!(result.unchanged.is_empty());
    }

    #[test]
    fn buckets_preserve_input_order() {
        let current = vec![make_record(5, 1.0), make_record(2, 1.0), make_record(9, 1.0)];
        let result = diff(&current, &[]);
        let order: Vec<&str> = result.added.iter().map(|r| r.alloc_no.as_str()).collect();
        assert_eq!(order, ["5", "2", "9"]);
    }

    #[test]
    fn field_changes_report_in_field_list_order() {
        let mut current = make_record(1, 50.0);
        current.country = Some("DE".to_string());
        let mut previous = make_record(1, 40.0);
        previous.country = Some("FR".to_string());
        previous.alloc_end_date = Some("2025-02-28".to_string());

        let changes = field_changes(&current, &previous);
        let fields: Vec<TrackedField> = changes.iter().map(|c| c.field).collect();
        assert_eq!(
            fields,
            [
                TrackedField::AllocEndDate,
                TrackedField::Percent,
                TrackedField::Country,
            ]
        );
    }

    #[test]
    fn field_changes_are_symmetric_when_empty() {
        let a = make_record(1, 50.0);
        let b = a.clone();
        assert!(field_changes(&a, &b).is_empty());
        assert!(field_changes(&b, &a).is_empty());
    }

    #[test]
    fn field_change_orientation_follows_argument_order() {
        let current = make_record(1, 50.0);
        let previous = make_record(1, 40.0);

        let forward = field_changes(&current, &previous);
        assert_eq!(forward[0].from, json!(40.0));
        assert_eq!(forward[0].to, json!(50.0));

        let backward = field_changes(&previous, &current);
        assert_eq!(backward[0].from, json!(50.0));
        assert_eq!(backward[0].to, json!(40.0));
    }

    #[test]
    fn textually_different_dates_count_as_changes() {
        let mut current = make_record(1, 50.0);
        current.alloc_start_date = Some("2025-1-1".to_string());
        let previous = make_record(1, 50.0);

        let changes = field_changes(&current, &previous);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, TrackedField::AllocStartDate);
    }

    #[test]
    fn missing_field_on_both_sides_is_not_a_change() {
        let current = AllocationRecord::new(1);
        let previous = AllocationRecord::new(1);
        assert!(field_changes(&current, &previous).is_empty());
    }

    #[test]
    fn duplicate_ids_compare_against_last_seen() {
        let current = vec![make_record(1, 50.0)];
        let previous = vec![make_record(1, 10.0), make_record(1, 50.0)];

        let result = diff(&current, &previous);
        // The second previous record wins the identity map, so the current
        // record matches it exactly.
        assert_eq!(result.unchanged.len(), 1);
        assert!(result.modified.is_empty());
        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn summary_net_change_arithmetic() {
        let current = vec![make_record(1, 50.0), make_record(2, 20.0)];
        let previous = vec![make_record(1, 40.0), make_record(3, 30.0)];

        let comparison = compare(&current, &previous, &request());
        let summary = comparison.summary;
        assert_eq!(summary.total_current, 2);
        assert_eq!(summary.total_previous, 2);
        assert_eq!(summary.net_change, 0);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.unchanged, 0);
        assert_eq!(
            summary.net_change,
            summary.total_current as i64 - summary.total_previous as i64
        );
    }

    #[test]
    fn empty_previous_summary() {
        let current = vec![make_record(1, 50.0), make_record(2, 20.0)];
        let comparison = compare(&current, &[], &request());

        assert_eq!(comparison.summary.added, 2);
        assert_eq!(comparison.summary.removed, 0);
        assert_eq!(comparison.summary.modified, 0);
        assert_eq!(comparison.summary.net_change, 2);
    }

    #[test]
    fn comparison_carries_request_key() {
        let comparison = compare(&[], &[], &request());
        assert_eq!(comparison.request, request());
    }
}
