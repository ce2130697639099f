pub mod commands;

pub use commands::{Cli, Commands};

use console::style;
use server_monitor::models::ConfigKey;
use server_monitor::state::AppState;
use std::sync::Arc;

/// Dispatch one command. Connection problems are printed, never returned as errors.
pub async fn execute(state: Arc<AppState>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run => state.run().await?,
        Commands::Status { fresh } => println!("{}", state.show_status(fresh).await),
        Commands::Push { target } => {
            state.push_report(target.as_deref()).await;
        }
        Commands::Show => println!("{}", state.show_config().await),
        Commands::Set { key, value } => {
            let message = match key.parse::<ConfigKey>() {
                Ok(key) => match state.set(key, &value).await {
                    Ok(message) => message,
                    Err(e) => format!("{} {}", style("❌").red(), e.user_message()),
                },
                Err(e) => format!("{} {}", style("❌").red(), e.user_message()),
            };
            println!("{}", message);
        }
        Commands::Probe => {
            let host = state.session.host().await;
            let result = state.probe().await;
            if result.reachable {
                println!("{} {} is reachable ({:.1} ms)", style("✅").green(), host, result.rtt_ms);
            } else {
                println!("{} {} is unreachable", style("❌").red(), host);
            }
        }
    }
    Ok(())
}
