//! Answers grounded on web search results instead of an index.

use crate::rag::ask::generation_request;
use crate::rag::prompt::compile;
use crate::rag::types::{RagOptions, WebAnswer};
use crate::search::{SearchProvider, SearchResult};
use handlebars::Handlebars;
use ragdesk_core::{AppError, AppResult};
use ragdesk_llm::LlmClient;
use serde::Serialize;

/// Prompt for web-grounded answers. The results block is left out when the
/// search found nothing.
pub const WEB_TEMPLATE: &str = "User Query: {{query}}\n\n\
{{#if results}}Web Search Results:\n\
{{#each results}}Title: {{title}}\nLink: {{link}}\nSnippet: {{snippet}}\n\n{{/each}}\
{{/if}}Based on the above information, provide a detailed and comprehensive answer.";

const TEMPLATE_NAME: &str = "web";

#[derive(Serialize)]
struct WebVars<'a> {
    query: &'a str,
    results: &'a [SearchResult],
}

/// Renders a query and its search hits (title, link, snippet) into one
/// prompt. Output is not HTML-escaped.
pub struct WebPromptBuilder {
    handlebars: Handlebars<'static>,
}

impl WebPromptBuilder {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            handlebars: compile(TEMPLATE_NAME, WEB_TEMPLATE)?,
        })
    }

    pub fn render(&self, query: &str, results: &[SearchResult]) -> AppResult<String> {
        self.handlebars
            .render(TEMPLATE_NAME, &WebVars { query, results })
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))
    }
}

/// Search the web for `query` and start a streamed generation grounded on
/// up to `limit` hits.
///
/// A search with no hits still generates, from the query alone. A failed
/// search is an error and the generator is not called.
pub async fn ask_web(
    query: &str,
    search: &dyn SearchProvider,
    limit: usize,
    llm: &dyn LlmClient,
    options: &RagOptions,
) -> AppResult<WebAnswer> {
    let builder = WebPromptBuilder::new()?;
    let results = search.search(query, limit).await?;
    if results.is_empty() {
        tracing::warn!("No search results for '{}', answering from the query alone", query);
    }

    let prompt = builder.render(query, &results)?;
    tracing::debug!("Prompt is {} bytes", prompt.len());

    let request = generation_request(prompt.clone(), options);
    tracing::info!(
        "Streaming answer from {} ({}) grounded on {} {} results",
        llm.provider_name(),
        request.model,
        results.len(),
        search.provider_name()
    );

    let stream = llm.stream(&request.with_streaming()).await?;

    Ok(WebAnswer {
        results,
        prompt,
        stream,
    })
}
