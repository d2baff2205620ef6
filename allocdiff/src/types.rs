use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identity of one allocation row.
///
/// The upstream service is inconsistent about the wire type of `AllocNo` and
/// emits either a JSON string or an integer; both forms normalize to the same
/// identifier. This is the sole join key when diffing two record sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AllocId(pub String);

impl AllocId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AllocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AllocId {
    fn from(value: &str) -> Self {
        AllocId(value.to_string())
    }
}

impl From<String> for AllocId {
    fn from(value: String) -> Self {
        AllocId(value)
    }
}

impl From<i64> for AllocId {
    fn from(value: i64) -> Self {
        AllocId(value.to_string())
    }
}

impl<'de> Deserialize<'de> for AllocId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl serde::de::Visitor<'_> for IdVisitor {
            type Value = AllocId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer allocation number")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<AllocId, E> {
                Ok(AllocId(value.to_string()))
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<AllocId, E> {
                Ok(AllocId(value.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<AllocId, E> {
                Ok(AllocId(value.to_string()))
            }

            fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<AllocId, E> {
                Ok(AllocId(value.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// The fixed set of fields whose change between two records of the same
/// identity counts as a modification. Order here is the order changes are
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackedField {
    AllocStartDate,
    AllocEndDate,
    Percent,
    ActivityDesc,
    ActivityNo,
    Country,
    StateCity,
    ReportingManagerEmpNo,
}

impl TrackedField {
    pub const ALL: [TrackedField; 8] = [
        TrackedField::AllocStartDate,
        TrackedField::AllocEndDate,
        TrackedField::Percent,
        TrackedField::ActivityDesc,
        TrackedField::ActivityNo,
        TrackedField::Country,
        TrackedField::StateCity,
        TrackedField::ReportingManagerEmpNo,
    ];

    /// Upstream field name, as it appears on the wire and in exported reports.
    pub fn name(self) -> &'static str {
        match self {
            TrackedField::AllocStartDate => "AllocStartDate",
            TrackedField::AllocEndDate => "AllocEndDate",
            TrackedField::Percent => "Percent",
            TrackedField::ActivityDesc => "ActivityDesc",
            TrackedField::ActivityNo => "ActivityNo",
            TrackedField::Country => "Country",
            TrackedField::StateCity => "StateCity",
            TrackedField::ReportingManagerEmpNo => "ReportingManagerEmpNo",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of allocation data returned by the upstream service.
///
/// Field names follow the upstream PascalCase wire shape. Date fields stay
/// opaque strings: two spellings of the same calendar date are different
/// values as far as change detection is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationRecord {
    pub alloc_no: AllocId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alloc_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alloc_end_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_manager_emp_no: Option<String>,
}

/// The upstream sends `Percent` as a number or a numeric string; anything
/// unparseable is treated as absent.
fn de_opt_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

impl AllocationRecord {
    /// Create a record with the given identity and no other data.
    pub fn new(alloc_no: impl Into<AllocId>) -> Self {
        Self {
            alloc_no: alloc_no.into(),
            emp_no: None,
            emp_name: None,
            project_code: None,
            alloc_start_date: None,
            alloc_end_date: None,
            percent: None,
            activity_desc: None,
            activity_no: None,
            country: None,
            state_city: None,
            reporting_manager_emp_no: None,
        }
    }

    pub fn with_employee(mut self, emp_no: impl Into<String>, emp_name: impl Into<String>) -> Self {
        self.emp_no = Some(emp_no.into());
        self.emp_name = Some(emp_name.into());
        self
    }

    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.alloc_start_date = Some(start.into());
        self.alloc_end_date = Some(end.into());
        self
    }

    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn with_activity(mut self, desc: impl Into<String>) -> Self {
        self.activity_desc = Some(desc.into());
        self
    }

    /// Project one tracked field into a JSON value for uniform comparison and
    /// change reporting. Absent fields project to `Null`.
    pub fn tracked_value(&self, field: TrackedField) -> Value {
        fn text(value: &Option<String>) -> Value {
            match value {
                Some(text) => Value::String(text.clone()),
                None => Value::Null,
            }
        }

        match field {
            TrackedField::AllocStartDate => text(&self.alloc_start_date),
            TrackedField::AllocEndDate => text(&self.alloc_end_date),
            TrackedField::Percent => self
                .percent
                .and_then(serde_json::Number::from_f64)
                .map_or(Value::Null, Value::Number),
            TrackedField::ActivityDesc => text(&self.activity_desc),
            TrackedField::ActivityNo => text(&self.activity_no),
            TrackedField::Country => text(&self.country),
            TrackedField::StateCity => text(&self.state_city),
            TrackedField::ReportingManagerEmpNo => text(&self.reporting_manager_emp_no),
        }
    }
}

/// Identity of a query: two requests with equal keys compare against each
/// other's snapshots. Equality is exact and case-sensitive on all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestKey {
    pub project_code: String,
    pub alloc_start_date: String,
    pub alloc_end_date: String,
    pub username: String,
}

impl RequestKey {
    pub fn new(
        project_code: impl Into<String>,
        alloc_start_date: impl Into<String>,
        alloc_end_date: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            project_code: project_code.into(),
            alloc_start_date: alloc_start_date.into(),
            alloc_end_date: alloc_end_date.into(),
            username: username.into(),
        }
    }
}

/// Upstream result fields echoed into the snapshot alongside the records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMeta {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Statistics derived from a record set when a snapshot is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub total_allocations: usize,
    pub unique_employees: usize,
    /// Sum of `Percent` across all records, rounded to 2 decimals.
    pub total_percentage: f64,
    /// Distinct non-empty countries, in first-appearance order.
    pub countries: Vec<String>,
    /// Distinct non-empty activity descriptions, in first-appearance order.
    pub activities: Vec<String>,
}

impl SnapshotSummary {
    pub fn for_records(records: &[AllocationRecord]) -> Self {
        let mut employees = Vec::new();
        let mut countries = Vec::new();
        let mut activities = Vec::new();
        let mut total_percentage = 0.0;

        for record in records {
            if !employees.contains(&record.emp_no) {
                employees.push(record.emp_no.clone());
            }
            if let Some(country) = record.country.as_deref()
                && !country.is_empty()
                && !countries.iter().any(|seen| seen == country)
            {
                countries.push(country.to_string());
            }
            if let Some(activity) = record.activity_desc.as_deref()
                && !activity.is_empty()
                && !activities.iter().any(|seen| seen == activity)
            {
                activities.push(activity.to_string());
            }
            total_percentage += record.percent.unwrap_or(0.0);
        }

        Self {
            total_allocations: records.len(),
            unique_employees: employees.len(),
            total_percentage: round2(total_percentage),
            countries,
            activities,
        }
    }
}

/// One persisted query result. Never mutated after creation; removed only by
/// log eviction or an explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request: RequestKey,
    pub records: Vec<AllocationRecord>,
    pub meta: QueryMeta,
    pub summary: SnapshotSummary,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alloc_id_accepts_string_and_number() {
        let from_number: AllocationRecord = serde_json::from_value(json!({"AllocNo": 42})).unwrap();
        let from_string: AllocationRecord =
            serde_json::from_value(json!({"AllocNo": "42"})).unwrap();
        assert_eq!(from_number.alloc_no, from_string.alloc_no);
        assert_eq!(from_number.alloc_no.as_str(), "42");
    }

    #[test]
    fn record_parses_upstream_shape() {
        let record: AllocationRecord = serde_json::from_value(json!({
            "AllocNo": 1001,
            "EmpNo": "E1",
            "EmpName": "Ada",
            "ProjectCode": "P1",
            "AllocStartDate": "2025-01-01",
            "AllocEndDate": "2025-03-31",
            "Percent": "50",
            "ActivityDesc": "Development",
            "Country": "DE"
        }))
        .unwrap();

        assert_eq!(record.alloc_no, AllocId::from(1001));
        assert_eq!(record.percent, Some(50.0));
        assert_eq!(record.activity_desc.as_deref(), Some("Development"));
        assert_eq!(record.state_city, None);
    }

    #[test]
    fn unparseable_percent_is_absent() {
        let record: AllocationRecord =
            serde_json::from_value(json!({"AllocNo": 1, "Percent": "n/a"})).unwrap();
        assert_eq!(record.percent, None);
    }

    #[test]
    fn tracked_values_follow_fixed_field_order() {
        let names: Vec<&str> = TrackedField::ALL.iter().map(|field| field.name()).collect();
        assert_eq!(
            names,
            [
                "AllocStartDate",
                "AllocEndDate",
                "Percent",
                "ActivityDesc",
                "ActivityNo",
                "Country",
                "StateCity",
                "ReportingManagerEmpNo",
            ]
        );
    }

    #[test]
    fn summary_counts_and_rounds() {
        let records = vec![
            AllocationRecord::new(1)
                .with_employee("E1", "Ada")
                .with_percent(33.335)
                .with_activity("Dev"),
            AllocationRecord::new(2)
                .with_employee("E1", "Ada")
                .with_percent(33.335)
                .with_activity("Dev"),
            AllocationRecord::new(3).with_employee("E2", "Grace"),
        ];

        let summary = SnapshotSummary::for_records(&records);
        assert_eq!(summary.total_allocations, 3);
        assert_eq!(summary.unique_employees, 2);
        assert_eq!(summary.total_percentage, 66.67);
        assert_eq!(summary.activities, vec!["Dev".to_string()]);
        assert!(summary.countries.is_empty());
    }

    #[test]
    fn summary_of_empty_set_is_zeroed() {
        let summary = SnapshotSummary::for_records(&[]);
        assert_eq!(summary.total_allocations, 0);
        assert_eq!(summary.unique_employees, 0);
        assert_eq!(summary.total_percentage, 0.0);
        assert!(summary.countries.is_empty());
        assert!(summary.activities.is_empty());
    }

    #[test]
    fn request_keys_compare_on_all_fields() {
        let key = RequestKey::new("P1", "2025-01-01", "2025-03-31", "ada");
        assert_eq!(key, RequestKey::new("P1", "2025-01-01", "2025-03-31", "ada"));
        assert_ne!(key, RequestKey::new("P1", "2025-01-01", "2025-03-31", "Ada"));
        assert_ne!(key, RequestKey::new("P2", "2025-01-01", "2025-03-31", "ada"));
    }
}
