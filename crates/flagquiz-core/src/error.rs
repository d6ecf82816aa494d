//! Core error types for flagquiz-core.
//!
//! Only [`QuestionError`] is ever surfaced to a player: a session cannot be
//! played without questions. Store failures are logged by the scheduler and
//! swallowed; the in-memory state machine is the source of truth while a
//! session is live.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flagquiz-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// State store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Question bank is missing or unusable
    #[error("Question data unavailable: {0}")]
    Question(#[from] QuestionError),

    /// The session runtime task is no longer running
    #[error("Session runtime has stopped")]
    RuntimeStopped,
}

/// State store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open state store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored record could not be decoded
    #[error("Saved state is corrupt: {0}")]
    Corrupt(String),

    /// Database is locked
    #[error("State store is locked")]
    Locked,

    /// Store refused the operation
    #[error("State store unavailable")]
    Unavailable,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// The question source could not supply a playable bank.
#[derive(Error, Debug)]
pub enum QuestionError {
    #[error("question file not found at {path}")]
    Missing { path: PathBuf },

    #[error("malformed question data: {0}")]
    Malformed(String),

    #[error("question bank is empty")]
    Empty,

    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

impl From<serde_json::Error> for QuestionError {
    fn from(err: serde_json::Error) -> Self {
        QuestionError::Malformed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_error_wraps_into_core() {
        let err: CoreError = QuestionError::Empty.into();
        assert_eq!(err.to_string(), "Question data unavailable: question bank is empty");
    }

    #[test]
    fn store_error_wraps_into_core() {
        let err: CoreError = StoreError::Locked.into();
        assert_eq!(err.to_string(), "Store error: State store is locked");
        assert_eq!(CoreError::RuntimeStopped.to_string(), "Session runtime has stopped");
    }

    #[test]
    fn json_error_maps_to_corrupt_store() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
