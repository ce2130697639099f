mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use server_monitor::services::config_service::ConfigService;
use server_monitor::state::{AppOptions, AppState};
use server_monitor::utils::logger;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    match &cli.log_level {
        Some(level) => logger::init_with_level(level),
        None => logger::init(),
    }

    tracing::info!("Server Monitor - Starting...");

    let config_service = match cli.config_dir {
        Some(dir) => ConfigService::with_dir(dir)?,
        None => ConfigService::new()?,
    };
    tracing::debug!("Using config directory {:?}", config_service.config_dir());

    let options = AppOptions {
        probe: !cli.no_probe,
    };
    let state = Arc::new(AppState::new(config_service, options));

    cli::execute(state, cli.command.unwrap_or(Commands::Run)).await
}
