//! Generation client crate for ragdesk.
//!
//! Provides a provider-agnostic abstraction over the model server that
//! produces answers: one-shot completion, fragment streaming and model
//! listing.
//!
//! # Providers
//! - **Ollama**: Local model runtime (default)
//!
//! # Example
//! ```no_run
//! use futures::StreamExt;
//! use ragdesk_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "qwen2.5:0.5b");
//! let mut stream = client.stream(&request).await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
mod ndjson;
pub mod providers;

// Re-export main types
pub use client::{
    LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage, ModelInfo,
};
pub use factory::{client_from_config, create_client};
pub use providers::OllamaClient;
