//! LLM provider factory.
//!
//! Builds an `LlmClient` from the resolved application settings.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use ragdesk_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client for a provider name.
///
/// # Arguments
/// * `provider` - Provider identifier (only "ollama" speaks generation today)
/// * `endpoint` - Base URL of the server
/// * `timeout` - Timeout for non-streaming requests
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown.
pub fn create_client(
    provider: &str,
    endpoint: &str,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::new(endpoint, timeout)?;
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: {}. Supported: ollama",
            provider
        ))),
    }
}

/// Create the generation client described by the application config.
pub fn client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    create_client(
        "ollama",
        &config.endpoint,
        Duration::from_secs(config.request_timeout_secs),
    )
}
