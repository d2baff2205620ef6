//! Persisted, bounded snapshot log.
//!
//! Snapshots are kept newest-first in a single serialized blob behind a
//! [`StorageBackend`]. Insertion order, not the stored timestamp, defines
//! recency: `find_previous` trusts that the head of the log is the most
//! recently stored entry.

mod backend;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};

use chrono::Utc;
use log::warn;

use crate::errors::StoreError;
use crate::id::snapshot_id;
use crate::keys::KeyContext;
use crate::types::{AllocationRecord, QueryMeta, RequestKey, Snapshot, SnapshotSummary};

/// Hard cap on retained snapshots. Inserting beyond it drops the oldest
/// entries; there is no TTL.
pub const MAX_STORED_SNAPSHOTS: usize = 50;

/// Default key prefix for the persisted log.
pub const DEFAULT_PREFIX: &str = "allocdiff";

/// The snapshot log, owned exclusively by this store.
///
/// All reads fail soft: an unreadable or corrupt log degrades to "empty" with
/// a logged warning. Comparison history is an enhancement to the query flow,
/// not a requirement of it.
#[derive(Debug)]
pub struct SnapshotStore<B> {
    backend: B,
    log_key: String,
}

impl<B: StorageBackend> SnapshotStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_prefix(backend, DEFAULT_PREFIX)
    }

    pub fn with_prefix(backend: B, prefix: &str) -> Self {
        let log_key = KeyContext::new(prefix).snapshot_log();
        Self { backend, log_key }
    }

    /// Persist a new snapshot at the head of the log.
    ///
    /// Derives the snapshot id and summary, prepends, trims the log to
    /// [`MAX_STORED_SNAPSHOTS`], and writes the whole log back.
    pub fn record(
        &mut self,
        request: &RequestKey,
        records: Vec<AllocationRecord>,
        meta: QueryMeta,
    ) -> Result<Snapshot, StoreError> {
        let snapshot = Snapshot {
            id: snapshot_id(request),
            timestamp: Utc::now(),
            request: request.clone(),
            summary: SnapshotSummary::for_records(&records),
            records,
            meta,
        };

        let mut log = self.get_all();
        log.insert(0, snapshot.clone());
        log.truncate(MAX_STORED_SNAPSHOTS);

        let blob = serde_json::to_string(&log)?;
        self.backend.set(&self.log_key, &blob)?;
        Ok(snapshot)
    }

    /// The most recently stored snapshot whose request key equals `request`
    /// on all four fields, or `None` for a first request.
    pub fn find_previous(&self, request: &RequestKey) -> Option<Snapshot> {
        self.get_all()
            .into_iter()
            .find(|snapshot| snapshot.request == *request)
    }

    /// The whole log, newest-first. Never fails: storage or parse errors
    /// degrade to an empty log.
    pub fn get_all(&self) -> Vec<Snapshot> {
        let blob = match self.backend.get(&self.log_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("snapshot log unreadable, treating as empty: {err}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&blob) {
            Ok(log) => log,
            Err(err) => {
                warn!("snapshot log corrupt, treating as empty: {err}");
                Vec::new()
            }
        }
    }

    /// Snapshots for one project and user, newest-first, regardless of date
    /// range, capped at `limit`.
    pub fn history(&self, project_code: &str, username: &str, limit: usize) -> Vec<Snapshot> {
        self.get_all()
            .into_iter()
            .filter(|snapshot| {
                snapshot.request.project_code == project_code
                    && snapshot.request.username == username
            })
            .take(limit)
            .collect()
    }

    /// Remove the entire log. Backend failures are logged, not propagated.
    pub fn clear(&mut self) {
        if let Err(err) = self.backend.remove(&self.log_key) {
            warn!("failed to clear snapshot log: {err}");
        }
    }
}
