use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Server Monitor - SSH reachability monitoring with daily reports and disconnect alerts
#[derive(Parser, Debug)]
#[command(name = "server-monitor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Skip the ICMP reachability check before reconnecting
    #[arg(long, global = true)]
    pub no_probe: bool,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the health monitor and daily report scheduler
    Run,

    /// Show current server status
    Status {
        /// Bypass the status cache
        #[arg(short, long)]
        fresh: bool,
    },

    /// Push a status report now
    Push {
        /// Deliver to this target instead of report_target
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Show current configuration (password masked)
    Show,

    /// Update a configuration value
    Set {
        /// One of: ip, port, user, pwd, key, report_time, report_target, alert_target
        key: String,

        /// New value. For `key`, either a file path or the private key text itself
        value: String,
    },

    /// Check network reachability of the server
    Probe,
}
