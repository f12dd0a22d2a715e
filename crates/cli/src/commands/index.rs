//! Index command handler.
//!
//! Builds (or rebuilds) a named index from uploads, a repository checkout or
//! web pages.

use crate::commands::{embedder, open_store, print_json};
use clap::{Args, Subcommand};
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{learn_files, learn_repository, learn_web, BuildOutcome};
use std::path::PathBuf;

/// Build an index from documents
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub source: IndexSource,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum IndexSource {
    /// Index uploaded files (pdf, docx, txt, html)
    Files {
        /// Index name
        name: String,

        /// Files or directories of files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Index a repository checkout (py, md, txt, js, java, c, cpp)
    Repo {
        /// Index name
        name: String,

        /// Checkout directory
        dir: PathBuf,
    },

    /// Index web pages
    Web {
        /// Index name
        name: String,

        /// Start URL
        url: String,

        /// Crawl depth (levels of pages fetched)
        #[arg(long, default_value_t = 2, conflicts_with = "single")]
        depth: usize,

        /// Fetch only the given page
        #[arg(long)]
        single: bool,
    },
}

impl IndexSource {
    fn name(&self) -> &str {
        match self {
            Self::Files { name, .. } | Self::Repo { name, .. } | Self::Web { name, .. } => name,
        }
    }
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for '{}'", self.source.name());
        tracing::debug!("Index options: {:?}", self);

        let store = open_store(config);
        let embedder = embedder(config)?;

        let outcome = match &self.source {
            IndexSource::Files { name, paths } => {
                learn_files(&store, name, paths, embedder.as_ref()).await?
            }
            IndexSource::Repo { name, dir } => {
                learn_repository(&store, name, dir, embedder.as_ref()).await?
            }
            IndexSource::Web {
                name,
                url,
                depth,
                single,
            } => {
                let depth = (!single).then_some(*depth);
                learn_web(
                    &store,
                    name,
                    url,
                    depth,
                    std::time::Duration::from_secs(config.request_timeout_secs),
                    embedder.as_ref(),
                )
                .await?
            }
        };

        self.report(&outcome)
    }

    fn report(&self, outcome: &BuildOutcome) -> AppResult<()> {
        let stats = &outcome.stats;

        if self.json {
            return print_json(&serde_json::json!({
                "index": outcome.index.name(),
                "indexed": stats.indexed,
                "skipped": stats.skipped,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
                "model": outcome.index.model(),
                "dimensions": outcome.index.dimensions(),
            }));
        }

        println!(
            "Indexed {} documents into '{}' ({} bytes) in {:.2}s",
            stats.indexed,
            outcome.index.name(),
            stats.bytes_processed,
            stats.duration_secs
        );
        if !stats.skipped.is_empty() {
            println!("Skipped {}:", stats.skipped.len());
            for skipped in &stats.skipped {
                println!("  - {}: {}", skipped.source, skipped.reason);
            }
        }

        Ok(())
    }
}
