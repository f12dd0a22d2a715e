//! Error types for ragdesk.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! model-server, extraction, embedding and index-store failures.

use thiserror::Error;

/// Unified error type for ragdesk.
///
/// All fallible functions return `Result<T, AppError>`. Whether a variant
/// aborts an operation or only skips one input is decided by the caller:
/// batch operations (extraction, index builds, crawls) log and skip
/// `UnsupportedFormat`, `Extraction` and `EmbeddingFailed`; single-item
/// operations (one query, one generation) propagate everything. A
/// `Network` failure means the service itself is unreachable and aborts
/// batches too.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation/model-server errors (transport, status, stream decoding)
    #[error("LLM error: {0}")]
    Llm(String),

    /// A service could not be reached or its response could not be read
    #[error("Network error: {0}")]
    Network(String),

    /// Input has a file type the extractor does not handle
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Input has a supported type but its text could not be extracted
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The embedding service did not return a usable vector
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// No persisted index exists under this name
    #[error("Index '{0}' not found")]
    IndexNotFound(String),

    /// A persisted index exists but cannot be decoded
    #[error("Index '{name}' is corrupted: {reason}")]
    IndexCorrupted { name: String, reason: String },

    /// Index names double as file names and are restricted accordingly
    #[error("Invalid index name '{0}': use ASCII letters, digits, '-', '_' or '.'")]
    InvalidIndexName(String),

    /// Other knowledge-pipeline errors (crawl setup, prompt rendering)
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a batch operation may skip the offending input and continue.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFormat(_)
                | AppError::Extraction(_)
                | AppError::EmbeddingFailed(_)
        )
    }
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
