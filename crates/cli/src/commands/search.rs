//! Search command handler.

use crate::commands::print_json;
use clap::Args;
use futures::StreamExt;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::crawl::http_client;
use ragdesk_knowledge::rag::{self, RagOptions};
use ragdesk_knowledge::{DuckDuckGoSearch, SearchResult, DEFAULT_RESULT_COUNT};
use ragdesk_llm::client_from_config;
use std::io::Write;
use std::time::Duration;

/// Answer a question from web search results
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// The question to ask
    pub query: String,

    /// Number of search results to ground the answer on
    #[arg(long, default_value_t = DEFAULT_RESULT_COUNT)]
    pub results: usize,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON (implies --no-stream)
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search command options: {:?}", self);

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let search = DuckDuckGoSearch::new(http_client(timeout)?, &config.search_endpoint)?;
        let client = client_from_config(config)?;
        let options = RagOptions::from_config(config);

        let mut answer = rag::ask_web(
            &self.query,
            &search,
            self.results,
            client.as_ref(),
            &options,
        )
        .await?;

        tracing::debug!("Prompt: {}", answer.prompt);

        if self.no_stream || self.json {
            let text = rag::collect_answer(answer.stream).await?;

            if self.json {
                return print_json(&serde_json::json!({
                    "query": self.query,
                    "model": options.model,
                    "answer": text,
                    "results": answer.results,
                }));
            }

            println!("{}", text);
            print_sources(&answer.results);
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        while let Some(result) = answer.stream.next().await {
            let chunk = result?;

            if !chunk.content.is_empty() {
                print!("{}", chunk.content);
                stdout.flush().ok();
            }

            if chunk.done {
                break;
            }
        }

        println!();
        print_sources(&answer.results);
        Ok(())
    }
}

fn print_sources(results: &[SearchResult]) {
    if results.is_empty() {
        return;
    }

    println!();
    println!("Sources:");
    for (i, result) in results.iter().enumerate() {
        println!("  {}. {} <{}>", i + 1, result.title, result.link);
    }
}
