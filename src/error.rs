//! Error types for tk
//!
//! Exit codes:
//! - 0: Success
//! - 1: Cancelled (a deletion with subtasks was aborted)
//! - 2: User error (unknown id, duplicate id, bad args, bad config)
//! - 4: Operation failed (I/O, serialization)

use thiserror::Error;

/// Exit codes for the tk CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CANCELLED: i32 = 1;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tk operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task ID '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Cancellation (exit code 1)
    #[error("Delete cancelled: {0}")]
    Cancelled(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::AlreadyExists(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Cancelled(_) => exit_codes::CANCELLED,

            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => {
                exit_codes::OPERATION_FAILED
            }
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound(id) | Error::AlreadyExists(id) | Error::Cancelled(id) => {
                Some(serde_json::json!({ "id": id }))
            }
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for tk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
