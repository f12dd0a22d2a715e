//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extracted text awaiting embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    /// Provenance: file path or URL
    pub source: String,

    /// Full extracted text (never chunked)
    pub text: String,
}

impl SourceText {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// One indexed unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub embedding: Vec<f32>,
    pub document: String,
    pub source: String,
}

/// An input that a batch operation skipped, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skipped {
    pub source: String,
    pub reason: String,
}

impl Skipped {
    pub fn new(source: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            source: source.into(),
            reason: reason.to_string(),
        }
    }
}

/// The single best match for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieved {
    /// Full text of the matching document
    pub document: String,

    /// Provenance of the matching document
    pub source: String,

    /// Cosine similarity to the query. No threshold is applied; callers
    /// decide whether a weak match is good enough.
    pub score: f32,

    /// Position of the record in the index (insertion order)
    pub position: usize,
}

/// Statistics from an index build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Records embedded and stored
    pub indexed: u32,

    /// Records dropped because embedding failed or disagreed on dimensionality
    pub skipped: Vec<Skipped>,

    /// Total bytes of text embedded
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub name: String,

    /// Number of records
    pub records: usize,

    /// Embedding dimensionality of the first record, if any
    pub dimensions: Option<usize>,

    /// Embedding model recorded at build time
    pub model: Option<String>,

    pub built_at: Option<DateTime<Utc>>,

    /// Size of the persisted blob in bytes
    pub size_bytes: u64,
}
