//! Ask command handler.
//!
//! Retrieves the best document from an index and has the generation model
//! answer the question using it.

use crate::commands::{embedder, open_store, print_json};
use clap::Args;
use futures::StreamExt;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::rag::{self, RagOptions};
use ragdesk_llm::client_from_config;
use std::io::Write;

/// Answer a question grounded on the best-matching document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Index name
    pub name: String,

    /// The question to ask
    pub query: String,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Maximum tokens in response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON (implies --no-stream)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for '{}'", self.name);
        tracing::debug!("Ask command options: {:?}", self);

        let index = open_store(config).load(&self.name)?;
        let embedder = embedder(config)?;
        let client = client_from_config(config)?;
        let options = self.options(config);

        if self.no_stream || self.json {
            let Some(response) = rag::answer(
                &index,
                &self.query,
                embedder.as_ref(),
                client.as_ref(),
                &options,
            )
            .await?
            else {
                return self.no_match();
            };

            if self.json {
                return print_json(&serde_json::json!({
                    "index": self.name,
                    "model": options.model,
                    "answer": response.answer,
                    "source": response.source,
                    "score": response.score,
                }));
            }

            println!("{}", response.answer);
            println!();
            println!("Source: {} (score {:.4})", response.source, response.score);
            return Ok(());
        }

        let Some(mut answer) = rag::ask(
            &index,
            &self.query,
            embedder.as_ref(),
            client.as_ref(),
            &options,
        )
        .await?
        else {
            return self.no_match();
        };

        tracing::debug!("Prompt: {}", answer.prompt);

        let mut stdout = std::io::stdout();
        while let Some(result) = answer.stream.next().await {
            let chunk = result?;

            if !chunk.content.is_empty() {
                print!("{}", chunk.content);
                stdout.flush().ok();
            }

            if chunk.done {
                if let Some(usage) = chunk.usage {
                    tracing::debug!(
                        "Token usage - Prompt: {}, Completion: {}, Total: {}",
                        usage.prompt_tokens,
                        usage.completion_tokens,
                        usage.total_tokens
                    );
                }
                break;
            }
        }

        println!();
        println!();
        println!(
            "Source: {} (score {:.4})",
            answer.retrieved.source, answer.retrieved.score
        );

        Ok(())
    }

    /// Config-derived options with the per-call flags applied.
    fn options(&self, config: &AppConfig) -> RagOptions {
        let mut options = RagOptions::from_config(config);
        if let Some(max_tokens) = self.max_tokens {
            options.generation.max_tokens = Some(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            options.generation.temperature = Some(temperature);
        }
        options
    }

    fn no_match(&self) -> AppResult<()> {
        if self.json {
            return print_json(&serde_json::json!({
                "index": self.name,
                "answer": null,
            }));
        }
        println!("No matching document in '{}'", self.name);
        Ok(())
    }
}
