use std::io;
use std::path::PathBuf;

/// Baseline persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Reading, writing or locking a state file failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being done (`read`, `write`, `lock`).
        action: &'static str,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Snapshot could not be serialized.
    #[error("failed to encode baseline: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
