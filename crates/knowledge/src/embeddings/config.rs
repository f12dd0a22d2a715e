//! Embedding provider settings.

use ragdesk_core::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS};
use ragdesk_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dimensionality of the offline mock provider.
pub const MOCK_DIMENSIONS: usize = 384;

/// Settings needed to build an [`EmbeddingProvider`](super::EmbeddingProvider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Base URL of the embedding server
    pub endpoint: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Vector size produced by the mock provider; remote models decide their own
    #[serde(default = "default_mock_dimensions")]
    pub mock_dimensions: usize,
}

fn default_mock_dimensions() -> usize {
    MOCK_DIMENSIONS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            mock_dimensions: MOCK_DIMENSIONS,
        }
    }
}

impl EmbeddingConfig {
    /// Offline configuration backed by the mock provider.
    pub fn mock() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            ..Self::default()
        }
    }

    /// Derive embedding settings from the resolved application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            endpoint: config.endpoint.clone(),
            timeout_secs: config.request_timeout_secs,
            mock_dimensions: MOCK_DIMENSIONS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.model.trim().is_empty() {
            return Err(AppError::Config(
                "Embedding model must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Embedding timeout must be greater than zero".to_string(),
            ));
        }

        if self.provider == "mock" && self.mock_dimensions == 0 {
            return Err(AppError::Config(
                "Mock embedding dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_app_config() {
        let mut app = AppConfig::default();
        app.embedding_model = "nomic-embed-text".to_string();
        app.endpoint = "http://gpu-box:11434".to_string();
        app.request_timeout_secs = 30;

        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.endpoint, "http://gpu-box:11434");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let config = EmbeddingConfig {
            model: "  ".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
