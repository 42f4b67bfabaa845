use std::path::PathBuf;

use metahub_types::Version;

/// Errors from resource store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-swap mismatch: the stored version is not the expected one.
    ///
    /// `found` is `0` when the resource does not exist.
    #[error("overwriting conflict on {path}: expected version {expected}, found {found}")]
    Conflict {
        path: String,
        expected: Version,
        found: Version,
    },

    /// A resource required by the caller does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The path violates the resource path rules.
    #[error("invalid resource path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The configured root location is missing or is not a directory.
    #[error("metadata root not found: {0}")]
    RootNotFound(PathBuf),

    /// Serialization or deserialization of a typed entity failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for a compare-and-swap mismatch.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
