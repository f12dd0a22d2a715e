//! Generation server providers.

pub mod ollama;

pub use ollama::OllamaClient;
