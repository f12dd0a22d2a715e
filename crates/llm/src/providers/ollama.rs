//! Ollama LLM provider implementation.
//!
//! Talks to a local Ollama server (or anything speaking the same API).
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{
    LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage, ModelInfo,
};
use crate::ndjson;
use futures::StreamExt;
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const GENERATE_ENDPOINT: &str = "/api/generate";
const TAGS_ENDPOINT: &str = "/api/tags";

/// Connect timeout for every request, including streaming ones.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    options: OllamaOptions,
    stream: bool,
}

/// Sampling options nested under `options`.
#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.num_predict.is_none()
    }
}

/// One object of a generate response (the whole body when not streaming,
/// one NDJSON line when streaming). Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// Timeout for non-streaming calls
    request_timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// Streaming calls only apply the connect timeout so that long answers
    /// are not cut off mid-generation.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
            client,
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
            stream: request.stream,
        }
    }

    /// Turn a non-success response into an error carrying the body text.
    async fn status_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AppError::Llm(format!("Ollama API error ({}): {}", status, error_text))
    }
}

/// Parse one NDJSON line of a streamed generate response.
fn parse_stream_line(line: &str) -> AppResult<LlmStreamChunk> {
    let parsed: OllamaResponse = serde_json::from_str(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;

    let usage = parsed.done.then(|| parsed.usage());

    if let Some(error) = parsed.error {
        return Err(AppError::Llm(format!("Ollama stream error: {}", error)));
    }

    Ok(LlmStreamChunk {
        content: parsed.response.unwrap_or_default(),
        model: parsed.model,
        done: parsed.done,
        usage,
    })
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Ollama");

        let mut ollama_request = self.to_ollama_request(request);
        ollama_request.stream = false;
        let url = format!("{}{}", self.base_url, GENERATE_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = ollama_response.usage();

        if let Some(error) = ollama_response.error {
            return Err(AppError::Llm(format!("Ollama error: {}", error)));
        }

        tracing::info!("Received completion from Ollama");

        Ok(LlmResponse {
            content: ollama_response.response.unwrap_or_default(),
            model: ollama_response.model,
            usage,
            done: ollama_response.done,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming request to Ollama");

        let mut ollama_request = self.to_ollama_request(request);
        ollama_request.stream = true;

        let url = format!("{}{}", self.base_url, GENERATE_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send streaming request: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let chunks = ndjson::lines(Box::pin(response.bytes_stream())).map(|line| match line {
            Ok(line) => parse_stream_line(&line),
            Err(e) => Err(AppError::Llm(format!("Stream error: {}", e))),
        });

        Ok(Box::pin(chunks))
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        let url = format!("{}{}", self.base_url, TAGS_ENDPOINT);
        tracing::debug!("Fetching model list from {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to reach Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models)
    }
}
