//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// One call per text; callers embed serially. A failed call surfaces as
/// `AppError::EmbeddingFailed` and is never retried here.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate the embedding for one text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.as_str() {
        "mock" => {
            let provider = super::providers::mock::MockProvider::new(config.mock_dimensions);
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = super::providers::ollama::OllamaProvider::new(config)?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, mock",
            config.provider
        ))),
    }
}
