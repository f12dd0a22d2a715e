//! Embedding providers.
//!
//! Turns text into fixed-length vectors. Index builds and queries go through
//! the same [`EmbeddingProvider`], one text per call.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
