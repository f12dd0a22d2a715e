//! Stats command handler.
//!
//! Shows what a persisted index holds.

use crate::commands::{open_store, print_json};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Index name
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for '{}'", self.name);

        let stats = open_store(config).stats(&self.name)?;

        if self.json {
            return print_json(&serde_json::to_value(&stats)?);
        }

        println!("Index:      {}", stats.name);
        println!("Records:    {}", stats.records);
        println!(
            "Dimensions: {}",
            stats
                .dimensions
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        println!("Model:      {}", stats.model.as_deref().unwrap_or("-"));
        println!(
            "Built:      {}",
            stats
                .built_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        );
        println!("Size:       {} bytes", stats.size_bytes);

        Ok(())
    }
}
