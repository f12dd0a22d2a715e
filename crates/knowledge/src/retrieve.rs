//! Top-1 retrieval by cosine similarity.
//!
//! A linear scan over every record. Records whose dimensionality differs
//! from the query are not comparable and are ignored. Ties go to the record
//! inserted first.

use crate::embeddings::EmbeddingProvider;
use crate::index::Index;
use crate::types::Retrieved;
use ragdesk_core::AppResult;

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when the lengths differ, either vector has zero norm, or
/// the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Position and score of the most similar comparable record.
///
/// `None` when the index holds no record of the query's dimensionality.
pub fn best_match(index: &Index, query: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    let mut incomparable = 0usize;

    for (position, embedding) in index.embeddings().iter().enumerate() {
        if embedding.len() != query.len() {
            incomparable += 1;
            continue;
        }

        let score = cosine_similarity(query, embedding);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((position, score)),
        }
    }

    if incomparable > 0 {
        tracing::debug!(
            "Ignored {} records with dimensionality other than {}",
            incomparable,
            query.len()
        );
    }

    best
}

/// Embed `query` and return the best-matching document of `index`.
///
/// `Ok(None)` means nothing comparable was found: the index is empty or no
/// record shares the query's dimensionality. A failed query embedding is an
/// error.
pub async fn retrieve(
    index: &Index,
    query: &str,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<Option<Retrieved>> {
    let query_embedding = embedder.embed(query).await?;

    let Some((position, score)) = best_match(index, &query_embedding) else {
        tracing::info!(
            "No comparable records in index '{}' ({} records)",
            index.name(),
            index.len()
        );
        return Ok(None);
    };

    let retrieved = Retrieved {
        document: index.documents()[position].clone(),
        source: index.sources()[position].clone(),
        score,
        position,
    };

    tracing::info!(
        "Best match in '{}': {} (score {:.3}, position {})",
        index.name(),
        retrieved.source,
        retrieved.score,
        retrieved.position
    );

    Ok(Some(retrieved))
}
