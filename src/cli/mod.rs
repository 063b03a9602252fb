use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod run;

#[derive(Parser)]
#[command(name = "doorman")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Join-request moderation bot for Telegram channels", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        /// Path for the config file (default: ~/.local/share/doorman/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the bot service
    Run {
        /// Path to config file (default: ~/.local/share/doorman/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { config, force } => {
            let path = config.unwrap_or_else(config::default_config_path);
            if path.exists() && !force {
                return Err(format!(
                    "Config file '{}' already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            config::DoormanConfig::create_default(&path)?;
            println!("Wrote default config to {}", path.display());
            println!("Fill in telegram.token and channels.monitored, then run `doorman run`.");
            Ok(())
        }

        Commands::Run { config } => {
            let path = config.unwrap_or_else(config::default_config_path);
            run::execute(&path).await
        }
    }
}
