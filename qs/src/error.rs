//! Store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the run store, the paginator and the exporters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error at {path}: {reason}")]
    Storage {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to persist run {run_id}: {reason}")]
    Persistence {
        run_id: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Run not found: {run_id}")]
    NotFound { run_id: String },

    #[error("Corrupt data in {path}: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias used across the crate
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn persistence(run_id: &str, reason: impl Into<String>) -> Self {
        Self::Persistence {
            run_id: run_id.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn persistence_io(run_id: &str, what: &str, source: std::io::Error) -> Self {
        Self::Persistence {
            run_id: run_id.to_string(),
            reason: format!("{}: {}", what, source),
            source: Some(source),
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
