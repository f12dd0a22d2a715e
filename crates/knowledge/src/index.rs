//! In-memory index: three parallel sequences of embeddings, documents and
//! sources.

use crate::types::IndexRecord;
use chrono::{DateTime, Utc};
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A named collection of indexed records.
///
/// `embeddings`, `documents` and `sources` always have equal length; the
/// only way to grow an index is [`Index::push`]. Records pushed through this
/// type share one dimensionality. Blobs loaded from disk are checked for
/// equal lengths but may mix dimensionalities; the retriever skips records
/// that do not match the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    name: String,

    #[serde(default)]
    model: Option<String>,

    #[serde(default)]
    built_at: Option<DateTime<Utc>>,

    embeddings: Vec<Vec<f32>>,
    documents: Vec<String>,
    sources: Vec<String>,
}

impl Index {
    /// Create an empty index.
    pub fn new(name: impl Into<String>, model: Option<String>) -> Self {
        Self {
            name: name.into(),
            model,
            built_at: None,
            embeddings: Vec::new(),
            documents: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Append a record.
    ///
    /// Rejects empty embeddings and embeddings whose dimensionality differs
    /// from the records already present. The index is left unchanged and
    /// the caller decides whether to skip the record.
    pub fn push(&mut self, record: IndexRecord) -> AppResult<()> {
        if record.embedding.is_empty() {
            return Err(AppError::Knowledge(format!(
                "empty embedding for {}",
                record.source
            )));
        }

        if let Some(expected) = self.dimensions() {
            if record.embedding.len() != expected {
                return Err(AppError::Knowledge(format!(
                    "dimension mismatch for {}: expected {}, got {}",
                    record.source,
                    expected,
                    record.embedding.len()
                )));
            }
        }

        self.embeddings.push(record.embedding);
        self.documents.push(record.document);
        self.sources.push(record.source);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Embedding model the index was built with, when known.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub(crate) fn mark_built(&mut self, at: DateTime<Utc>) {
        self.built_at = Some(at);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Dimensionality of the first record.
    pub fn dimensions(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Owned copy of the record at `position`.
    pub fn record(&self, position: usize) -> Option<IndexRecord> {
        Some(IndexRecord {
            embedding: self.embeddings.get(position)?.clone(),
            document: self.documents.get(position)?.clone(),
            source: self.sources.get(position)?.clone(),
        })
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = IndexRecord> + '_ {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    /// Check the parallel-sequence invariant of a deserialized index.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        let (e, d, s) = (
            self.embeddings.len(),
            self.documents.len(),
            self.sources.len(),
        );
        if e != d || d != s {
            return Err(format!(
                "parallel sequences differ in length: {} embeddings, {} documents, {} sources",
                e, d, s
            ));
        }
        Ok(())
    }
}
