//! Persistent index storage.
//!
//! Each index is one JSON blob at `<dir>/<name>.json`. Writes go to a
//! sibling temp file that is renamed into place, so readers never see a
//! half-written index. Concurrent builds of the same name are
//! last-writer-wins.

use crate::embeddings::EmbeddingProvider;
use crate::index::Index;
use crate::types::{BuildStats, IndexRecord, IndexStats, Skipped, SourceText};
use chrono::Utc;
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Format tag written into every blob.
pub const INDEX_FORMAT: &str = "ragdesk-index/1";

const INDEX_EXTENSION: &str = "json";

#[derive(Serialize)]
struct StoredIndexRef<'a> {
    format: &'a str,
    #[serde(flatten)]
    index: &'a Index,
}

#[derive(Deserialize)]
struct StoredIndex {
    format: String,
    #[serde(flatten)]
    index: Index,
}

/// Result of [`IndexStore::build`].
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub index: Index,
    pub stats: BuildStats,
}

/// Directory of named indices.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the blob for `name`.
    pub fn index_path(&self, name: &str) -> AppResult<PathBuf> {
        validate_index_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, INDEX_EXTENSION)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Embed every record serially and persist the result under `name`,
    /// replacing any existing index of that name.
    ///
    /// Records whose embedding fails, or whose dimensionality disagrees with
    /// the first accepted record, are logged and skipped. Any other error,
    /// including an unreachable embedding service, aborts the build and
    /// leaves the previous index untouched.
    pub async fn build(
        &self,
        name: &str,
        records: Vec<SourceText>,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<BuildOutcome> {
        validate_index_name(name)?;

        let start = Instant::now();
        let total = records.len();
        tracing::info!(
            "Building index '{}' from {} documents with {}/{}",
            name,
            total,
            embedder.provider_name(),
            embedder.model_name()
        );

        let mut index = Index::new(name, Some(embedder.model_name().to_string()));
        let mut stats = BuildStats::default();

        for (i, record) in records.into_iter().enumerate() {
            tracing::debug!("Embedding {}/{}: {}", i + 1, total, record.source);

            let embedding = match embedder.embed(&record.text).await {
                Ok(embedding) => embedding,
                Err(e) if e.is_skippable() => {
                    tracing::warn!("Skipping {}: {}", record.source, e);
                    stats.skipped.push(Skipped::new(record.source, e));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let bytes = record.text.len() as u64;
            let source = record.source.clone();
            let pushed = index.push(IndexRecord {
                embedding,
                document: record.text,
                source: record.source,
            });

            match pushed {
                Ok(()) => {
                    stats.indexed += 1;
                    stats.bytes_processed += bytes;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", source, e);
                    stats.skipped.push(Skipped::new(source, e));
                }
            }
        }

        index.mark_built(Utc::now());
        self.save(&index)?;

        stats.duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Index '{}' built: {} records, {} skipped, {} bytes in {:.2}s",
            name,
            stats.indexed,
            stats.skipped.len(),
            stats.bytes_processed,
            stats.duration_secs
        );

        Ok(BuildOutcome { index, stats })
    }

    /// Write `index` under its name, replacing any previous blob.
    pub fn save(&self, index: &Index) -> AppResult<()> {
        let path = self.index_path(index.name())?;
        fs::create_dir_all(&self.dir)?;

        let blob = serde_json::to_vec(&StoredIndexRef {
            format: INDEX_FORMAT,
            index,
        })?;

        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", index.name(), std::process::id()));
        fs::write(&tmp, &blob)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(
            "Saved index '{}' ({} records, {} bytes) to {}",
            index.name(),
            index.len(),
            blob.len(),
            path.display()
        );
        Ok(())
    }

    /// Read the index persisted under `name`.
    pub fn load(&self, name: &str) -> AppResult<Index> {
        let path = self.index_path(name)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::IndexNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let corrupted = |reason: String| AppError::IndexCorrupted {
            name: name.to_string(),
            reason,
        };

        let stored: StoredIndex =
            serde_json::from_slice(&bytes).map_err(|e| corrupted(e.to_string()))?;

        if stored.format != INDEX_FORMAT {
            return Err(corrupted(format!("unknown format '{}'", stored.format)));
        }
        stored.index.check_consistency().map_err(corrupted)?;

        tracing::debug!(
            "Loaded index '{}' with {} records",
            name,
            stored.index.len()
        );
        Ok(stored.index)
    }

    /// Names of all persisted indices. A missing directory is an empty set.
    pub fn list(&self) -> AppResult<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(INDEX_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_index_name(stem).is_ok() {
                    names.insert(stem.to_string());
                }
            }
        }

        Ok(names)
    }

    /// Summary of a persisted index.
    pub fn stats(&self, name: &str) -> AppResult<IndexStats> {
        let index = self.load(name)?;
        let size_bytes = fs::metadata(self.index_path(name)?)?.len();

        Ok(IndexStats {
            name: name.to_string(),
            records: index.len(),
            dimensions: index.dimensions(),
            model: index.model().map(str::to_string),
            built_at: index.built_at(),
            size_bytes,
        })
    }
}

/// Index names become file names: ASCII alphanumerics, `-`, `_` and `.`,
/// not starting with `.`.
pub fn validate_index_name(name: &str) -> AppResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidIndexName(name.to_string()))
    }
}
