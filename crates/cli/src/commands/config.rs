//! Config command handler.

use clap::{Args, Subcommand};
use ragdesk_core::{config::AppConfig, AppResult};

/// Inspect or initialize settings
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration as YAML
    Show,

    /// Write the resolved configuration to the settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match self.action {
            ConfigAction::Show => {
                tracing::info!("Showing configuration");
                println!("# {}", config.settings_path().display());
                print!("{}", serde_yaml::to_string(&config.to_settings())?);
            }
            ConfigAction::Init { force } => {
                tracing::info!("Initializing settings file");
                let path = config.write_settings(force)?;
                println!("Wrote {}", path.display());
            }
        }
        Ok(())
    }
}
