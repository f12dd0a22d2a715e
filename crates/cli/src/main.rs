//! ragdesk CLI
//!
//! Main entry point for the ragdesk command-line tool.
//! Builds named document indices and answers questions from the best match.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ConfigCommand, IndexCommand, ListCommand, ModelsCommand, QueryCommand,
    SearchCommand, StatsCommand,
};
use ragdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// ragdesk - ask questions of your documents with a local model
#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "Ask questions of your documents with a local model", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to settings file (default: <workspace>/.ragdesk/config.yaml)
    #[arg(short, long, global = true, env = "RAGDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Model server endpoint
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Generation model
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Embedding model
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build or rebuild a named index
    Index(IndexCommand),

    /// List indices
    List(ListCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Retrieve the best-matching document
    Query(QueryCommand),

    /// Answer a question from the best-matching document
    Ask(AskCommand),

    /// Answer a question from web search results
    Search(SearchCommand),

    /// List models on the server
    Models(ModelsCommand),

    /// Show or initialize settings
    Config(ConfigCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Index(_) => "index",
            Commands::List(_) => "list",
            Commands::Stats(_) => "stats",
            Commands::Query(_) => "query",
            Commands::Ask(_) => "ask",
            Commands::Search(_) => "search",
            Commands::Models(_) => "models",
            Commands::Config(_) => "config",
        }
    }

    /// `config init --config <path>` targets a file that may not exist yet.
    fn creates_settings(&self) -> bool {
        matches!(
            self,
            Commands::Config(ConfigCommand {
                action: commands::config::ConfigAction::Init { .. }
            })
        )
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = load_config(&cli)?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ragdesk starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Endpoint: {}", config.endpoint);
    tracing::debug!("Model: {}", config.model);
    tracing::debug!(
        "Embeddings: {} ({})",
        config.embedding_model,
        config.embedding_provider
    );

    config.ensure_ragdesk_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::List(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Models(cmd) => cmd.execute(&config).await,
        Commands::Config(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

/// Resolve settings file, environment and flags into a validated config.
fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    let config = if cli.command.creates_settings() && cli.config.is_some() {
        let mut config = AppConfig::load(cli.workspace.clone(), None)?;
        config.config_file = cli.config.clone();
        config
    } else {
        AppConfig::load(cli.workspace.clone(), cli.config.clone())?
    };

    let config = config.with_overrides(
        cli.endpoint.clone(),
        cli.model.clone(),
        cli.embedding_model.clone(),
        cli.log_level.clone(),
        cli.verbose,
        cli.no_color,
    );

    config.validate()?;
    Ok(config)
}
