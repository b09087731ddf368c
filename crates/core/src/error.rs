//! Error types for ragdesk.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, LLM, knowledge/retrieval, prompt,
//! authorization and pipeline errors.

use thiserror::Error;

/// Unified error type for ragdesk.
///
/// All fallible functions return `Result<T, AppError>`.
/// Degraded paths (empty retrieval, apology answers) are not errors and
/// never surface through this type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector index, embedding and audit storage errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Caller is authenticated but not allowed to perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Unexpected failure inside the query pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(String),

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
