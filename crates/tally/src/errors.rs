//! Error types for the tally crate.

use thiserror::Error;

/// Errors surfaced by hierarchy, persistence, and sync operations
#[derive(Error, Debug, Clone)]
pub enum TallyError {
    // Hierarchy errors
    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Work package '{work_package_id}' not found")]
    WorkPackageNotFound { work_package_id: String },

    #[error("Sub-project '{sub_project_id}' not found")]
    SubProjectNotFound { sub_project_id: String },

    #[error("Invalid status: '{status}'")]
    InvalidStatus { status: String },

    // Storage errors
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    // Sync errors
    #[error("Remote file '{path}' changed since the last sync")]
    SyncConflict { path: String },

    #[error("Remote request failed: {reason}")]
    RemoteError { reason: String },
}

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TallyError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteError {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for tally operations
pub type TallyResult<T> = Result<T, TallyError>;
