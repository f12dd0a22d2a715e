//! Ollama Embedding Provider
//!
//! Provides semantic embeddings via Ollama's local API using models like
//! `mxbai-embed-large` or `nomic-embed-text`.
//!
//! # Features
//! - Local-first (no API costs, privacy-preserving)
//! - One request per text, with an explicit request timeout
//! - No retries: a failed call is reported and the caller decides
//! - A bad status or body is `EmbeddingFailed` (skip the text); an
//!   unreachable server is `Network` (abort)
//!
//! # Example
//! ```no_run
//! use ragdesk_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use ragdesk_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn demo() -> ragdesk_core::AppResult<()> {
//! let provider = OllamaProvider::new(&EmbeddingConfig::default())?;
//! let embedding = provider.embed("Hello world").await?;
//! println!("{} dimensions", embedding.len());
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use ragdesk_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Connect timeout, independent of the configured request timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "mxbai-embed-large:latest")
    model: String,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    /// Model name to use
    model: &'a str,
    /// Text to embed
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    /// Embedding vector
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    /// Error message
    error: String,
}

impl OllamaProvider {
    /// Create a provider from configuration.
    ///
    /// No request is made here; an unreachable server shows up on the first
    /// `embed` call.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Decode an embeddings response body.
fn parse_embedding(body: &str) -> AppResult<Vec<f32>> {
    let parsed: EmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        AppError::EmbeddingFailed(format!("Failed to parse Ollama response: {}", e))
    })?;

    if parsed.embedding.is_empty() {
        return Err(AppError::EmbeddingFailed(
            "Ollama returned an empty embedding".to_string(),
        ));
    }

    Ok(parsed.embedding)
}

/// Build the error for a non-success status, preferring Ollama's own message.
fn status_error(status: reqwest::StatusCode, body: &str) -> AppError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_response) => AppError::EmbeddingFailed(format!(
            "Ollama API error ({}): {}",
            status, error_response.error
        )),
        Err(_) => AppError::EmbeddingFailed(format!("Ollama API error ({}): {}", status, body)),
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read Ollama response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let embedding = parse_embedding(&body)?;
        debug!("Generated {} dimensional embedding", embedding.len());
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let config = EmbeddingConfig {
            endpoint: "http://localhost:11434/".to_string(),
            model: "nomic-embed-text".to_string(),
            ..EmbeddingConfig::default()
        };

        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(EmbeddingRequest {
            model: "mxbai-embed-large:latest",
            prompt: "hello",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "mxbai-embed-large:latest", "prompt": "hello"})
        );
    }

    #[test]
    fn test_parse_embedding() {
        let embedding = parse_embedding(r#"{"embedding":[0.5,-0.25,1.0]}"#).unwrap();
        assert_eq!(embedding, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_parse_embedding_failures_are_skippable() {
        for body in [r#"{"embedding":[]}"#, r#"{"other":1}"#, "not json"] {
            let err = parse_embedding(body).unwrap_err();
            assert!(err.is_skippable(), "{} should be skippable", body);
        }
    }

    #[test]
    fn test_status_error_prefers_server_message() {
        let err = status_error(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error":"model \"x\" not found, try pulling it first"}"#,
        );
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("try pulling it first"));
        assert!(matches!(err, AppError::EmbeddingFailed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = EmbeddingConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..EmbeddingConfig::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();

        let err = provider.embed("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(!err.is_skippable());
    }
}
