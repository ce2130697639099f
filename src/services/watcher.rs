use crate::services::config_service::ConfigService;
use crate::services::guard::{ConfigChangeGuard, SetOutcome};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// How often `config.toml` is re-read while running
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(10);

/// Picks up edits made to `config.toml` by other processes (`set` from a
/// second shell, or a hand edit) and feeds them through the change guard.
pub struct ConfigWatcher {
    config: Arc<ConfigService>,
    guard: Arc<ConfigChangeGuard>,
    interval: Duration,
}

impl ConfigWatcher {
    pub fn new(config: Arc<ConfigService>, guard: Arc<ConfigChangeGuard>) -> Self {
        Self {
            config,
            guard,
            interval: RELOAD_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Compare the file with the live configuration once.
    ///
    /// Returns `None` when nothing changed on disk.
    pub async fn poll_once(&self) -> Result<Option<SetOutcome>> {
        let changes = self.config.pending_changes().await?;
        if changes.is_empty() {
            return Ok(None);
        }

        for (key, _) in &changes {
            tracing::info!("{} changed in config file", key);
        }
        self.guard.apply(&changes).await.map(Some)
    }

    /// Re-read the file forever, waiting out each triggered reconnect
    pub async fn run(self: Arc<Self>) {
        tracing::info!("Watching {:?} every {:?}", self.config.config_dir(), self.interval);
        loop {
            tokio::time::sleep(self.interval).await;
            match self.poll_once().await {
                Ok(Some(outcome)) => {
                    if let Some(reconnect) = outcome.wait().await {
                        tracing::debug!("Reload reconnect: {}", reconnect.message);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring config file change: {}", e),
            }
        }
    }
}
