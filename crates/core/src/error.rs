//! Error types for the catalog chunker.
//!
//! This module defines a unified error enum that covers every fatal condition
//! in the application: configuration, I/O, schema descriptors, structural
//! violations in input records, the embedding collaborator and serialization.
//! Non-fatal conditions (missing optional fields, render failures, count
//! mismatches) are never errors; they are collected as diagnostics.

use thiserror::Error;

/// Unified error type for the catalog chunker.
///
/// All fallible functions in the application return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unknown schema descriptor
    #[error("Schema error: {0}")]
    Schema(String),

    /// Structural violation in an input record; aborts that record
    #[error("Structural error: {0}")]
    Structural(String),

    /// Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Structural("Missing required key: products".to_string());
        assert_eq!(
            err.to_string(),
            "Structural error: Missing required key: products"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
