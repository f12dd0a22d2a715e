//! RAG request and response types.

use crate::search::SearchResult;
use crate::types::Retrieved;
use ragdesk_core::{AppConfig, GenerationSettings};
use ragdesk_llm::LlmStream;
use serde::{Deserialize, Serialize};

/// Generation settings for one grounded answer.
#[derive(Debug, Clone, Default)]
pub struct RagOptions {
    /// Generation model
    pub model: String,

    /// Sampling options forwarded to the server
    pub generation: GenerationSettings,

    /// Handlebars prompt template; the built-in one when `None`
    pub prompt_template: Option<String>,
}

impl RagOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            generation: config.generation.clone(),
            prompt_template: config.prompt_template.clone(),
        }
    }
}

/// A retrieved document and the generation streaming from it.
///
/// The stream is lazy: nothing more is read from the server once the caller
/// stops polling or drops it.
pub struct RagAnswer {
    pub retrieved: Retrieved,

    /// The exact prompt sent to the generator
    pub prompt: String,

    pub stream: LlmStream,
}

/// Web search hits and the generation streaming from them.
pub struct WebAnswer {
    /// Hits rendered into the prompt, possibly none
    pub results: Vec<SearchResult>,

    /// The exact prompt sent to the generator
    pub prompt: String,

    pub stream: LlmStream,
}

/// A fully collected grounded answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Generated text, fragments concatenated in order
    pub answer: String,

    /// Provenance of the document the answer was grounded on
    pub source: String,

    /// Cosine similarity of that document to the query
    pub score: f32,
}
