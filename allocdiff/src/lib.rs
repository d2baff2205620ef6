//! Allocation snapshot comparison engine.
//!
//! Persists successive allocation query results as timestamped snapshots
//! keyed by query identity, locates the most recent prior snapshot for the
//! same key, and computes a structured diff between the two at the record,
//! employee, and activity granularity. The diff can be rendered into a flat
//! report shape for JSON export.
//!
//! Persistence goes through the [`StorageBackend`] trait; the comparator,
//! rollups, and report generator are pure functions over in-memory record
//! sets and can be used without any store at all.

pub mod client;
pub mod compare;
pub mod errors;
pub mod id;
pub mod keys;
pub mod report;
pub mod rollup;
pub mod store;
pub mod types;

pub use client::{Client, Ingest, QueryResult};
pub use compare::{
    Comparison, ComparisonSummary, FieldChange, ModifiedRecord, RecordDiff, compare, diff,
    field_changes,
};
pub use errors::{BackendError, StoreError};
pub use report::{Report, generate_report};
pub use rollup::{
    ActivityCountChange, EmployeeCountChange, EmployeePresence, EmployeeRollup, activity_changes,
    employee_changes,
};
pub use store::{
    JsonFileBackend, MAX_STORED_SNAPSHOTS, MemoryBackend, SnapshotStore, StorageBackend,
};
pub use types::{
    AllocId, AllocationRecord, QueryMeta, RequestKey, Snapshot, SnapshotSummary, TrackedField,
};
