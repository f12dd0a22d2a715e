//! Retrieve-then-generate.
//!
//! Picks the single best document for the query and asks the generator to
//! answer using it.

use crate::embeddings::EmbeddingProvider;
use crate::index::Index;
use crate::rag::prompt::PromptBuilder;
use crate::rag::types::{RagAnswer, RagOptions, RagResponse};
use crate::retrieve::retrieve;
use crate::types::Retrieved;
use futures::StreamExt;
use ragdesk_core::AppResult;
use ragdesk_llm::{LlmClient, LlmRequest, LlmStream};

/// Retrieve the best document for `query` and start a streamed generation
/// grounded on it.
///
/// `Ok(None)` when retrieval finds nothing comparable; the generator is not
/// called in that case.
pub async fn ask(
    index: &Index,
    query: &str,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmClient,
    options: &RagOptions,
) -> AppResult<Option<RagAnswer>> {
    let Some((retrieved, request)) = prepare(index, query, embedder, options).await? else {
        return Ok(None);
    };

    tracing::info!(
        "Streaming answer from {} ({}) grounded on {}",
        llm.provider_name(),
        request.model,
        retrieved.source
    );

    let prompt = request.prompt.clone();
    let stream = llm.stream(&request.with_streaming()).await?;

    Ok(Some(RagAnswer {
        retrieved,
        prompt,
        stream,
    }))
}

/// Like [`ask`], but waits for the whole answer in one non-streaming call.
pub async fn answer(
    index: &Index,
    query: &str,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmClient,
    options: &RagOptions,
) -> AppResult<Option<RagResponse>> {
    let Some((retrieved, request)) = prepare(index, query, embedder, options).await? else {
        return Ok(None);
    };

    tracing::info!(
        "Requesting answer from {} ({}) grounded on {}",
        llm.provider_name(),
        request.model,
        retrieved.source
    );

    let response = llm.complete(&request).await?;
    tracing::debug!(
        "Answer used {} prompt + {} completion tokens",
        response.usage.prompt_tokens,
        response.usage.completion_tokens
    );

    Ok(Some(RagResponse {
        answer: response.content,
        source: retrieved.source,
        score: retrieved.score,
    }))
}

/// Concatenate every fragment of a generation stream, in order.
///
/// Stops at the first error.
pub async fn collect_answer(mut stream: LlmStream) -> AppResult<String> {
    let mut answer = String::new();
    while let Some(chunk) = stream.next().await {
        answer.push_str(&chunk?.content);
    }
    Ok(answer)
}

async fn prepare(
    index: &Index,
    query: &str,
    embedder: &dyn EmbeddingProvider,
    options: &RagOptions,
) -> AppResult<Option<(Retrieved, LlmRequest)>> {
    let builder = PromptBuilder::new(options.prompt_template.as_deref())?;

    let Some(retrieved) = retrieve(index, query, embedder).await? else {
        return Ok(None);
    };

    let prompt = builder.render(&retrieved.document, &retrieved.source, query)?;
    tracing::debug!("Prompt is {} bytes", prompt.len());

    Ok(Some((retrieved, generation_request(prompt, options))))
}

/// Generation request for `prompt` with the configured model and sampling.
pub(crate) fn generation_request(prompt: String, options: &RagOptions) -> LlmRequest {
    let mut request = LlmRequest::new(prompt, options.model.clone());
    if let Some(temperature) = options.generation.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(top_p) = options.generation.top_p {
        request = request.with_top_p(top_p);
    }
    if let Some(max_tokens) = options.generation.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}
