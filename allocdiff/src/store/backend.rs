//! Pluggable persistence primitives for the snapshot log.
//!
//! A backend is a synchronous string-keyed blob store. The snapshot log lives
//! under a single key, so a backend only ever sees one serialized value per
//! store instance.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::errors::BackendError;

/// Synchronous string-keyed get/set/remove over serialized blobs.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove(&mut self, key: &str) -> Result<(), BackendError>;
}

/// In-memory backend. The injection point for tests and for hosts that bring
/// their own persistence layer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed backend: one JSON file per key inside a directory.
///
/// Key characters outside `[A-Za-z0-9]` are mapped to `_` when building the
/// file name.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl StorageBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(BackendError::new("get", err.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| BackendError::new("set", err.to_string()))?;
        std::fs::write(self.path_for(key), value).map_err(|err| BackendError::new("set", err.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BackendError::new("remove", err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips() {
        let mut backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn file_backend_sanitizes_keys() {
        let backend = JsonFileBackend::new("/tmp/allocdiff");
        let path = backend.path_for("allocdiff:snapshots");
        assert!(path.ends_with("allocdiff_snapshots.json"));
    }
}
