//! Flat, serialization-ready projection of a comparison for export.
//!
//! Field names and nesting here are an external contract: downstream tooling
//! parses exported reports, so renames are breaking changes.

use serde::{Deserialize, Serialize};

use crate::compare::{Comparison, FieldChange};
use crate::rollup::{ActivityCountChange, EmployeeCountChange, EmployeePresence};
use crate::types::{AllocId, AllocationRecord, round2};

/// Reason attached to every removed allocation in exported reports.
const REMOVAL_REASON: &str = "Allocation expired or removed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub executive_summary: ExecutiveSummary,
    pub allocation_changes: AllocationChanges,
    pub employee_impact: EmployeeImpact,
    pub activity_impact: Vec<ActivityCountChange>,
}

impl Report {
    /// Indented JSON text for download.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub net_change: i64,
    /// Net change relative to the previous total, as a percentage rounded to
    /// 2 decimals; defined as 0 when there was no previous data.
    pub change_percentage: f64,
    pub total_changes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationChanges {
    pub new_allocations: Vec<AllocationBrief>,
    pub removed_allocations: Vec<RemovedAllocation>,
    pub modified_allocations: Vec<ModifiedAllocation>,
}

/// Display-field projection of one allocation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationBrief {
    pub allocation_no: AllocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl AllocationBrief {
    fn from_record(record: &AllocationRecord) -> Self {
        Self {
            allocation_no: record.alloc_no.clone(),
            employee: record.emp_name.clone(),
            employee_no: record.emp_no.clone(),
            start_date: record.alloc_start_date.clone(),
            end_date: record.alloc_end_date.clone(),
            percentage: record.percent,
            activity: record.activity_desc.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedAllocation {
    #[serde(flatten)]
    pub allocation: AllocationBrief,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedAllocation {
    pub allocation_no: AllocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeImpact {
    pub new_employees: Vec<EmployeePresence>,
    pub removed_employees: Vec<EmployeePresence>,
    pub employees_with_changes: Vec<EmployeeCountChange>,
}

/// Project a comparison into the export shape. Lossless for everything the
/// report carries; the input is left untouched.
pub fn generate_report(comparison: &Comparison) -> Report {
    let summary = &comparison.summary;
    let change_percentage = if summary.total_previous > 0 {
        round2(summary.net_change as f64 / summary.total_previous as f64 * 100.0)
    } else {
        0.0
    };

    Report {
        executive_summary: ExecutiveSummary {
            net_change: summary.net_change,
            change_percentage,
            total_changes: summary.added + summary.removed + summary.modified,
        },
        allocation_changes: AllocationChanges {
            new_allocations: comparison
                .details
                .added
                .iter()
                .map(AllocationBrief::from_record)
                .collect(),
            removed_allocations: comparison
                .details
                .removed
                .iter()
                .map(|record| RemovedAllocation {
                    allocation: AllocationBrief::from_record(record),
                    reason: REMOVAL_REASON.to_string(),
                })
                .collect(),
            modified_allocations: comparison
                .details
                .modified
                .iter()
                .map(|entry| ModifiedAllocation {
                    allocation_no: entry.current.alloc_no.clone(),
                    employee: entry.current.emp_name.clone(),
                    changes: entry.changes.clone(),
                })
                .collect(),
        },
        employee_impact: EmployeeImpact {
            new_employees: comparison.employee_changes.added.clone(),
            removed_employees: comparison.employee_changes.removed.clone(),
            employees_with_changes: comparison.employee_changes.modified.clone(),
        },
        activity_impact: comparison.activity_changes.clone(),
    }
}
