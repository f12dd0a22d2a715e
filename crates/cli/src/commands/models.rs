//! Models command handler.

use crate::commands::print_json;
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_llm::client_from_config;

/// List models available on the generation server
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing models command against {}", config.endpoint);

        let client = client_from_config(config)?;
        let models = client.list_models().await?;

        if self.json {
            return print_json(&serde_json::to_value(&models)?);
        }

        if models.is_empty() {
            println!("No models on {}", config.endpoint);
        }
        for model in &models {
            let marker = if model.name == config.model || model.name == config.embedding_model {
                "*"
            } else {
                " "
            };
            match model.size {
                Some(size) => println!("{} {} ({:.1} MB)", marker, model.name, size as f64 / 1e6),
                None => println!("{} {}", marker, model.name),
            }
        }

        Ok(())
    }
}
