//! Command handlers for the ragdesk CLI.
//!
//! One submodule per subcommand, plus the few helpers they share.

pub mod ask;
pub mod config;
pub mod index;
pub mod list;
pub mod models;
pub mod query;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use config::ConfigCommand;
pub use index::IndexCommand;
pub use list::ListCommand;
pub use models::ModelsCommand;
pub use query::QueryCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{create_provider, EmbeddingConfig, EmbeddingProvider, IndexStore};
use std::sync::Arc;

/// Index store rooted at the configured index directory.
pub(crate) fn open_store(config: &AppConfig) -> IndexStore {
    IndexStore::new(config.index_dir())
}

/// Embedding provider selected by the configuration.
pub(crate) fn embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&EmbeddingConfig::from_app_config(config))
}

/// Pretty-print a JSON value to stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First `max` characters of `text` on one line, with an ellipsis when cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}
