//! Error types shared across the crate

use thiserror::Error;

/// Failure while reading or writing a persisted snapshot
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Failure while surfacing a notification to the user
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("alert board unavailable: {0}")]
    Board(String),
}
