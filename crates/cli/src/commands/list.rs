//! List command handler.

use crate::commands::{open_store, print_json};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};

/// List persisted indices
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing list command");

        let store = open_store(config);
        let names = store.list()?;

        if self.json {
            return print_json(&serde_json::json!({
                "indexDir": store.dir(),
                "indices": names,
            }));
        }

        if names.is_empty() {
            println!("No indices in {}", store.dir().display());
        } else {
            for name in &names {
                println!("{}", name);
            }
        }

        Ok(())
    }
}
