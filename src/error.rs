//! Error types for task-events

use thiserror::Error;

/// Errors that can abort a log conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Field {key} is not numeric: {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("Invalid task configuration: {0}")]
    InvalidConfig(String),

    #[error("No task configuration matches {0}")]
    NoMatchingConfig(String),

    #[error("Failed to decode log: {0}")]
    Decode(String),
}
