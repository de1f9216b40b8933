//! Snapshot store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Snapshot store errors.
///
/// Any of these is fatal to the reconciliation pass that hit it; the state
/// computed in that pass is discarded.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the state file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not a valid document.
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the state failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Referenced team is not tracked.
    #[error("team '{0}' is not tracked")]
    NotTracked(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
