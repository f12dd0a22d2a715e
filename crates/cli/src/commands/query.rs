//! Query command handler.
//!
//! Retrieval only: prints the best-matching document without generating.

use crate::commands::{embedder, open_store, preview, print_json};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::retrieve;

/// Find the document most similar to a query
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Index name
    pub name: String,

    /// Query text
    pub query: String,

    /// Print the whole document instead of a preview
    #[arg(long)]
    pub full: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

const PREVIEW_CHARS: usize = 300;

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command for '{}'", self.name);

        let index = open_store(config).load(&self.name)?;
        let embedder = embedder(config)?;
        let result = retrieve(&index, &self.query, embedder.as_ref()).await?;

        if self.json {
            return print_json(&serde_json::json!({
                "index": self.name,
                "query": self.query,
                "match": result,
            }));
        }

        match result {
            Some(retrieved) => {
                println!("Source: {}", retrieved.source);
                println!("Score:  {:.4}", retrieved.score);
                println!();
                if self.full {
                    println!("{}", retrieved.document);
                } else {
                    println!("{}", preview(&retrieved.document, PREVIEW_CHARS));
                }
            }
            None => println!("No matching document in '{}'", self.name),
        }

        Ok(())
    }
}
