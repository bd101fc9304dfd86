//! Error types for the Every Note client
//!
//! All errors use thiserror for structured error handling.
//! Recoverable failures are absorbed by the note store; these values
//! mostly surface in logs and in the results of user-initiated calls.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Whether the server reported the target as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound(_) => true,
            AppError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(AppError::NotFound("note 1".to_string()).is_not_found());
        assert!(AppError::Api {
            status: 404,
            message: "Note not found".to_string()
        }
        .is_not_found());
        assert!(!AppError::Api {
            status: 500,
            message: "boom".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_api_error_display() {
        let err = AppError::Api {
            status: 400,
            message: "Cannot nest subtasks more than one level deep".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed (400): Cannot nest subtasks more than one level deep"
        );
    }
}
