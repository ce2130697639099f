use crate::models::ConfigKey;
use crate::services::config_service::ConfigService;
use crate::services::connector::{ConnectOutcome, RetryingConnector};
use crate::services::probe::Prober;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Outcome of a configuration mutation
#[derive(Debug)]
pub struct SetOutcome {
    pub keys: Vec<ConfigKey>,
    /// Whether connection-relevant fields changed
    pub changed: bool,
    /// Reconnect sequence spawned because of the change
    pub reconnect: Option<JoinHandle<ConnectOutcome>>,
}

impl SetOutcome {
    /// Wait for the spawned reconnect, if any
    pub async fn wait(self) -> Option<ConnectOutcome> {
        let handle = self.reconnect?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Reconnect task failed: {}", e);
                None
            }
        }
    }
}

/// Reconnects when a configuration change invalidates the current session
pub struct ConfigChangeGuard {
    config: Arc<ConfigService>,
    connector: Arc<RetryingConnector>,
    prober: Arc<dyn Prober>,
}

impl ConfigChangeGuard {
    pub fn new(
        config: Arc<ConfigService>,
        connector: Arc<RetryingConnector>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            connector,
            prober,
        }
    }

    /// Mutate one field. If the connection digest changed, a probe + reconnect
    /// sequence is spawned after the mutation has been committed.
    pub async fn set(&self, key: ConfigKey, value: &str) -> Result<SetOutcome> {
        self.apply(&[(key, value.to_string())]).await
    }

    /// Mutate several fields at once; at most one reconnect is spawned
    pub async fn apply(&self, changes: &[(ConfigKey, String)]) -> Result<SetOutcome> {
        let change = self.config.set_many(changes).await?;

        if !change.connection_changed() {
            return Ok(SetOutcome {
                keys: change.keys,
                changed: false,
                reconnect: None,
            });
        }

        tracing::info!(
            "Connection settings changed ({} -> {}), reconnecting",
            change.before,
            change.after
        );

        let connector = Arc::clone(&self.connector);
        let prober = Arc::clone(&self.prober);
        let handle = tokio::spawn(async move {
            let outcome = connector.reconnect_fresh(prober.as_ref()).await;
            if outcome.ok {
                tracing::info!("Reconnected after config change: {}", outcome.message);
            } else {
                tracing::warn!("Reconnect after config change failed: {}", outcome.message);
            }
            outcome
        });

        Ok(SetOutcome {
            keys: change.keys,
            changed: true,
            reconnect: Some(handle),
        })
    }
}
