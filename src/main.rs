//! Poliqa - policy Q&A conversation client
//!
//! Main entry point for the Poliqa CLI.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poliqa::cli::{Cli, Commands};
use poliqa::commands;
use poliqa::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration (missing file falls back to defaults)
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat");
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::Ask { question } => {
            tracing::info!("One-shot question");
            commands::ask::run_ask(config, question).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("History command");
            commands::history::handle_history(&config, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "poliqa=debug" } else { "poliqa=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
