//! Employee- and activity-level rollups over two record sets.
//!
//! Rollups compare the sets as groups, not record by record: an employee
//! whose allocation count is unchanged never appears here, even when the
//! content of individual allocations changed. Output follows first-appearance
//! order of the group keys in the inputs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::AllocationRecord;

/// Bucket label for records with no activity description.
pub const UNKNOWN_ACTIVITY: &str = "Unknown";

/// An employee present on only one side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePresence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emp_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emp_name: Option<String>,
    /// Allocation count on the side the employee appears on.
    pub allocations: usize,
}

/// An employee on both sides whose allocation count changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCountChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emp_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emp_name: Option<String>,
    pub allocations_before: usize,
    pub allocations_after: usize,
    pub change: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRollup {
    pub added: Vec<EmployeePresence>,
    pub removed: Vec<EmployeePresence>,
    pub modified: Vec<EmployeeCountChange>,
}

/// A change in how many records fall under one activity description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCountChange {
    pub activity: String,
    pub before: usize,
    pub after: usize,
    pub change: i64,
}

struct EmployeeGroup<'a> {
    name: Option<&'a str>,
    count: usize,
}

fn group_by_employee<'a>(
    records: &'a [AllocationRecord],
) -> (Vec<Option<&'a str>>, HashMap<Option<&'a str>, EmployeeGroup<'a>>) {
    let mut order = Vec::new();
    let mut groups: HashMap<Option<&str>, EmployeeGroup<'_>> = HashMap::new();
    for record in records {
        let key = record.emp_no.as_deref();
        let group = groups.entry(key).or_insert_with(|| {
            order.push(key);
            EmployeeGroup {
                // The first record seen for the group names it.
                name: record.emp_name.as_deref(),
                count: 0,
            }
        });
        group.count += 1;
    }
    (order, groups)
}

/// Employee-level rollup of two record sets.
pub fn employee_changes(
    current: &[AllocationRecord],
    previous: &[AllocationRecord],
) -> EmployeeRollup {
    let (current_order, current_groups) = group_by_employee(current);
    let (previous_order, previous_groups) = group_by_employee(previous);

    let mut rollup = EmployeeRollup::default();

    for key in &current_order {
        let group = &current_groups[key];
        match previous_groups.get(key) {
            None => rollup.added.push(EmployeePresence {
                emp_no: key.map(str::to_owned),
                emp_name: group.name.map(str::to_owned),
                allocations: group.count,
            }),
            Some(previous_group) if previous_group.count != group.count => {
                rollup.modified.push(EmployeeCountChange {
                    emp_no: key.map(str::to_owned),
                    emp_name: group.name.map(str::to_owned),
                    allocations_before: previous_group.count,
                    allocations_after: group.count,
                    change: group.count as i64 - previous_group.count as i64,
                });
            }
            Some(_) => {}
        }
    }

    for key in &previous_order {
        if !current_groups.contains_key(key) {
            let group = &previous_groups[key];
            rollup.removed.push(EmployeePresence {
                emp_no: key.map(str::to_owned),
                emp_name: group.name.map(str::to_owned),
                allocations: group.count,
            });
        }
    }

    rollup
}

fn group_by_activity<'a>(
    records: &'a [AllocationRecord],
) -> (Vec<&'a str>, HashMap<&'a str, usize>) {
    let mut order = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let activity = record
            .activity_desc
            .as_deref()
            .filter(|desc| !desc.is_empty())
            .unwrap_or(UNKNOWN_ACTIVITY);
        let count = counts.entry(activity).or_insert_with(|| {
            order.push(activity);
            0
        });
        *count += 1;
    }
    (order, counts)
}

/// Per-activity record counts across both sides; only activities whose count
/// changed are reported.
pub fn activity_changes(
    current: &[AllocationRecord],
    previous: &[AllocationRecord],
) -> Vec<ActivityCountChange> {
    let (current_order, current_counts) = group_by_activity(current);
    let (previous_order, previous_counts) = group_by_activity(previous);

    let mut names = current_order;
    for name in previous_order {
        if !current_counts.contains_key(name) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .filter_map(|activity| {
            let after = current_counts.get(activity).copied().unwrap_or(0);
            let before = previous_counts.get(activity).copied().unwrap_or(0);
            (before != after).then(|| ActivityCountChange {
                activity: activity.to_owned(),
                before,
                after,
                change: after as i64 - before as i64,
            })
        })
        .collect()
}
