//! High-level ingest workflow tying the snapshot store and the comparator
//! together: one call per successful upstream query.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::compare::{self, Comparison};
use crate::store::{SnapshotStore, StorageBackend};
use crate::types::{AllocationRecord, QueryMeta, RequestKey, Snapshot};

/// Upstream query result as delivered by the allocation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<AllocationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl QueryResult {
    fn meta(&self) -> QueryMeta {
        QueryMeta {
            success: self.success,
            filtered_count: self.filtered_count,
            original_count: self.original_count,
            status_code: self.status_code,
        }
    }
}

/// Outcome of ingesting one query result.
#[derive(Debug, Clone)]
pub struct Ingest {
    /// The stored snapshot, or `None` when persistence failed. The failure is
    /// logged and the query flow continues without history.
    pub snapshot: Option<Snapshot>,
    /// `None` on the first request for this key; comparisons are only ever
    /// computed against an actual previous snapshot, never against an
    /// implicit empty one.
    pub comparison: Option<Comparison>,
}

impl Ingest {
    /// True when no previous snapshot existed for the request key. An
    /// informational state, not an error.
    pub fn is_first_request(&self) -> bool {
        self.comparison.is_none()
    }
}

/// Entry point for callers: wraps a [`SnapshotStore`] and runs the
/// fetch-compare-store cycle.
pub struct Client<B> {
    store: SnapshotStore<B>,
}

impl<B: StorageBackend> Client<B> {
    pub fn new(backend: B) -> Self {
        Self {
            store: SnapshotStore::new(backend),
        }
    }

    pub fn with_prefix(backend: B, prefix: &str) -> Self {
        Self {
            store: SnapshotStore::with_prefix(backend, prefix),
        }
    }

    /// Persist `result` as a new snapshot and compare it against the most
    /// recent prior snapshot for the same request key.
    ///
    /// The lookup happens before the write, so a snapshot is never compared
    /// against itself.
    pub fn ingest(&mut self, request: &RequestKey, result: &QueryResult) -> Ingest {
        let previous = self.store.find_previous(request);
        let comparison = previous
            .as_ref()
            .map(|snapshot| compare::compare(&result.data, &snapshot.records, request));

        let snapshot = match self.store.record(request, result.data.clone(), result.meta()) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(
                    "failed to persist snapshot for project {}: {err}",
                    request.project_code
                );
                None
            }
        };

        Ingest {
            snapshot,
            comparison,
        }
    }

    pub fn store(&self) -> &SnapshotStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SnapshotStore<B> {
        &mut self.store
    }
}
