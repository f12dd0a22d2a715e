//! Document retrieval for ragdesk.
//!
//! Extracts text from uploads, repository checkouts and web pages, embeds
//! each document whole, stores the vectors as a flat named index and answers
//! queries with the single most similar document. Questions can also be
//! answered from web search results without an index.

pub mod crawl;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod rag;
pub mod retrieve;
pub mod search;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use crawl::{crawl, fetch_page, CrawlOutcome};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use extract::{extract_file, extract_files, extract_html, extract_repository, ExtractBatch};
pub use index::Index;
pub use retrieve::{best_match, cosine_similarity, retrieve};
pub use search::{DuckDuckGoSearch, SearchProvider, SearchResult, DEFAULT_RESULT_COUNT};
pub use store::{validate_index_name, BuildOutcome, IndexStore};
pub use types::{BuildStats, IndexRecord, IndexStats, Retrieved, Skipped, SourceText};

use ragdesk_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build `name` from an extraction batch.
///
/// Inputs skipped during extraction are reported alongside those skipped
/// during embedding. A batch with no documents is an error and leaves any
/// existing index of that name in place.
pub async fn index_batch(
    store: &IndexStore,
    name: &str,
    batch: ExtractBatch,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<BuildOutcome> {
    validate_index_name(name)?;

    if batch.documents.is_empty() {
        return Err(AppError::Knowledge(format!(
            "Nothing to index for '{}': {} inputs skipped",
            name,
            batch.skipped.len()
        )));
    }

    let mut outcome = store.build(name, batch.documents, embedder).await?;

    let mut skipped = batch.skipped;
    skipped.append(&mut outcome.stats.skipped);
    outcome.stats.skipped = skipped;

    Ok(outcome)
}

/// Extract uploaded files (directories expand to the files they contain)
/// and build `name` from them.
pub async fn learn_files(
    store: &IndexStore,
    name: &str,
    paths: &[PathBuf],
    embedder: &dyn EmbeddingProvider,
) -> AppResult<BuildOutcome> {
    tracing::info!("Indexing {} upload paths into '{}'", paths.len(), name);
    let batch = extract_files(&extract::expand_upload_paths(paths));
    index_batch(store, name, batch, embedder).await
}

/// Read a repository checkout and build `name` from it.
pub async fn learn_repository(
    store: &IndexStore,
    name: &str,
    root: &Path,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<BuildOutcome> {
    tracing::info!("Indexing repository {} into '{}'", root.display(), name);
    let documents = extract_repository(root)?;
    let batch = ExtractBatch {
        documents,
        skipped: Vec::new(),
    };
    index_batch(store, name, batch, embedder).await
}

/// Fetch web pages and build `name` from them.
///
/// With `depth` of `None` only `url` itself is fetched; otherwise the site is
/// crawled breadth-first to that depth.
pub async fn learn_web(
    store: &IndexStore,
    name: &str,
    url: &str,
    depth: Option<usize>,
    timeout: Duration,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<BuildOutcome> {
    validate_index_name(name)?;
    let client = crawl::http_client(timeout)?;

    let batch = match depth {
        None => {
            tracing::info!("Indexing page {} into '{}'", url, name);
            let page = fetch_page(&client, url).await?;
            if page.text.is_empty() {
                ExtractBatch {
                    documents: Vec::new(),
                    skipped: vec![Skipped::new(page.source, "no text extracted")],
                }
            } else {
                ExtractBatch {
                    documents: vec![page],
                    skipped: Vec::new(),
                }
            }
        }
        Some(depth) => {
            let outcome = crawl(&client, url, depth).await?;
            ExtractBatch {
                documents: outcome.documents,
                skipped: outcome.skipped,
            }
        }
    };

    index_batch(store, name, batch, embedder).await
}
