use std::borrow::Cow;

use thiserror::Error;

/// Failure raised by a storage backend operation.
#[derive(Debug, Error)]
#[error("storage {op} failed: {message}")]
pub struct BackendError {
    /// The backend operation that failed ("get", "set", "remove").
    pub op: &'static str,
    pub message: Cow<'static, str>,
}

impl BackendError {
    pub fn new(op: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

/// Top-level error type returned by the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot log could not be serialized for persistence.
    #[error("snapshot log serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The underlying storage primitive failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
