//! Retrieval behaviour over built and persisted indices.

use crate::embeddings::EmbeddingProvider;
use crate::index::Index;
use crate::retrieve::{best_match, cosine_similarity, retrieve};
use crate::store::IndexStore;
use crate::types::{IndexRecord, SourceText};
use crate::{index_batch, learn_files};
use ragdesk_core::{AppError, AppResult};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

/// Returns a fixed vector per text; unknown texts fail to embed.
#[derive(Debug, Default)]
struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed-v1"
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| AppError::EmbeddingFailed(format!("no vector for '{}'", text)))
    }
}

fn index_of(records: &[(&str, Vec<f32>)]) -> Index {
    let mut index = Index::new("test", None);
    for (source, embedding) in records {
        index
            .push(IndexRecord {
                embedding: embedding.clone(),
                document: format!("doc {}", source),
                source: source.to_string(),
            })
            .unwrap();
    }
    index
}

#[test]
fn test_cosine_symmetric_and_self_similar() {
    let vectors: [Vec<f32>; 3] = [
        vec![0.3, -0.7, 2.0],
        vec![1.0, 1.0, 1.0],
        vec![-4.0, 0.5, 0.25],
    ];

    for a in &vectors {
        assert!((cosine_similarity(a, a) - 1.0).abs() < 1e-6);
        for b in &vectors {
            assert_eq!(cosine_similarity(a, b), cosine_similarity(b, a));
        }
    }
}

#[test]
fn test_closest_direction_wins() {
    let index = index_of(&[("A", vec![1.0, 0.0]), ("B", vec![0.0, 1.0])]);

    let (position, score) = best_match(&index, &[0.9, 0.1]).unwrap();
    assert_eq!(position, 0);
    assert!(score > cosine_similarity(&[0.9, 0.1], &[0.0, 1.0]));
}

#[test]
fn test_tie_goes_to_first_inserted() {
    let index = index_of(&[
        ("first", vec![1.0, 1.0]),
        ("second", vec![2.0, 2.0]),
        ("other", vec![0.0, 1.0]),
    ]);

    let (position, _) = best_match(&index, &[3.0, 3.0]).unwrap();
    assert_eq!(position, 0);
}

#[tokio::test]
async fn test_exact_direction_beats_near_neighbour() {
    let index = index_of(&[
        ("A", vec![1.0, 0.0]),
        ("B", vec![0.0, 1.0]),
        ("C", vec![0.9, 0.1]),
    ]);
    let embedder = FixedEmbedder::default().with("query", vec![1.0, 0.0]);

    let retrieved = retrieve(&index, "query", &embedder).await.unwrap().unwrap();
    assert_eq!(retrieved.source, "A");
    assert_eq!(retrieved.document, "doc A");
    assert_eq!(retrieved.position, 0);
    assert!((retrieved.score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_identical_records_return_first_inserted() {
    let index = index_of(&[("A", vec![1.0, 0.0]), ("B", vec![1.0, 0.0])]);
    let embedder = FixedEmbedder::default().with("query", vec![1.0, 0.0]);

    let retrieved = retrieve(&index, "query", &embedder).await.unwrap().unwrap();
    assert_eq!(retrieved.source, "A");
    assert_eq!(retrieved.position, 0);
}

#[test]
fn test_empty_index_has_no_match() {
    assert!(best_match(&Index::new("empty", None), &[1.0, 0.0]).is_none());
}

#[tokio::test]
async fn test_dimension_mismatch_is_no_match() {
    let index = index_of(&[("A", vec![1.0, 0.0, 0.0]), ("B", vec![0.0, 1.0, 0.0])]);
    let embedder = FixedEmbedder::default().with("short query", vec![1.0, 0.0]);

    let result = retrieve(&index, "short query", &embedder).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_mixed_dimensions_on_disk_compare_only_matching() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("mixed.json"),
        r#"{"format":"ragdesk-index/1","name":"mixed",
            "embeddings":[[1.0,0.0,0.0],[0.0,1.0],[0.6,0.8]],
            "documents":["three dims","two dims","also two"],
            "sources":["a","b","c"]}"#,
    )
    .unwrap();

    let index = IndexStore::new(temp.path()).load("mixed").unwrap();
    let embedder = FixedEmbedder::default().with("q", vec![1.0, 0.0]);

    let retrieved = retrieve(&index, "q", &embedder).await.unwrap().unwrap();
    assert_eq!(retrieved.source, "c");
    assert_eq!(retrieved.position, 2);
    assert!((retrieved.score - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn test_query_embedding_failure_is_error() {
    let index = index_of(&[("A", vec![1.0, 0.0])]);

    let result = retrieve(&index, "unknown", &FixedEmbedder::default()).await;
    assert!(matches!(result, Err(AppError::EmbeddingFailed(_))));
}

#[tokio::test]
async fn test_build_then_load_preserves_order() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = FixedEmbedder::default()
        .with("alpha", vec![1.0, 0.0])
        .with("beta", vec![0.0, 1.0])
        .with("gamma", vec![0.7, 0.7]);

    let records = vec![
        SourceText::new("a.txt", "alpha"),
        SourceText::new("b.txt", "beta"),
        SourceText::new("g.txt", "gamma"),
    ];
    store.build("ordered", records, &embedder).await.unwrap();

    let loaded = store.load("ordered").unwrap();
    let records: Vec<(String, String, Vec<f32>)> = loaded
        .records()
        .map(|r| (r.source, r.document, r.embedding))
        .collect();

    assert_eq!(
        records,
        vec![
            ("a.txt".to_string(), "alpha".to_string(), vec![1.0, 0.0]),
            ("b.txt".to_string(), "beta".to_string(), vec![0.0, 1.0]),
            ("g.txt".to_string(), "gamma".to_string(), vec![0.7, 0.7]),
        ]
    );
}

#[tokio::test]
async fn test_build_skips_failed_and_mismatched_embeddings() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = FixedEmbedder::default()
        .with("good one", vec![1.0, 0.0])
        .with("wrong size", vec![1.0, 0.0, 0.0])
        .with("good two", vec![0.0, 1.0]);

    let records = vec![
        SourceText::new("1", "good one"),
        SourceText::new("2", "unembeddable"),
        SourceText::new("3", "wrong size"),
        SourceText::new("4", "good two"),
    ];
    let outcome = store.build("partial", records, &embedder).await.unwrap();

    assert_eq!(outcome.stats.indexed, 2);
    let skipped: Vec<&str> = outcome
        .stats
        .skipped
        .iter()
        .map(|s| s.source.as_str())
        .collect();
    assert_eq!(skipped, vec!["2", "3"]);

    let loaded = store.load("partial").unwrap();
    assert_eq!(loaded.sources(), &["1".to_string(), "4".to_string()]);
}

#[tokio::test]
async fn test_rebuild_replaces_previous_index() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = FixedEmbedder::default()
        .with("old", vec![1.0, 0.0])
        .with("new", vec![0.0, 1.0]);

    store
        .build("docs", vec![SourceText::new("old.txt", "old")], &embedder)
        .await
        .unwrap();
    store
        .build("docs", vec![SourceText::new("new.txt", "new")], &embedder)
        .await
        .unwrap();

    let loaded = store.load("docs").unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.sources(), &["new.txt".to_string()]);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_build_gives_no_match() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = FixedEmbedder::default().with("q", vec![1.0]);

    store.build("empty", Vec::new(), &embedder).await.unwrap();
    let index = store.load("empty").unwrap();

    assert!(retrieve(&index, "q", &embedder).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unsupported_upload_is_skipped() {
    let temp = TempDir::new().unwrap();
    let notes = temp.path().join("notes.txt");
    let sheet = temp.path().join("budget.xlsx");
    fs::write(&notes, "the meeting is on tuesday").unwrap();
    fs::write(&sheet, [0x50u8, 0x4b, 0x03, 0x04]).unwrap();

    let store = IndexStore::new(temp.path().join("indices"));
    let embedder = FixedEmbedder::default().with("the meeting is on tuesday", vec![0.2, 0.9]);

    let outcome = learn_files(&store, "uploads", &[sheet.clone(), notes.clone()], &embedder)
        .await
        .unwrap();

    assert_eq!(outcome.stats.indexed, 1);
    assert_eq!(outcome.stats.skipped.len(), 1);
    assert_eq!(outcome.stats.skipped[0].source, sheet.display().to_string());

    let index = store.load("uploads").unwrap();
    assert_eq!(index.sources(), &[notes.display().to_string()]);
}

#[tokio::test]
async fn test_empty_batch_keeps_existing_index() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let embedder = FixedEmbedder::default().with("kept", vec![1.0]);

    store
        .build("docs", vec![SourceText::new("kept.txt", "kept")], &embedder)
        .await
        .unwrap();

    let result = index_batch(&store, "docs", Default::default(), &embedder).await;
    assert!(matches!(result, Err(AppError::Knowledge(_))));
    assert_eq!(store.load("docs").unwrap().len(), 1);
}
