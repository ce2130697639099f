use crate::services::cache::StatusSource;
use crate::services::config_service::SharedConfig;
use crate::services::connector::RetryingConnector;
use crate::services::notifier::Notifier;
use crate::services::probe::Prober;
use crate::state::{ConnectionState, HealthState};
use crate::utils::clock::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poll interval
pub const CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// Time since the last success before an alert fires
pub const ALERT_GRACE_SECS: i64 = 1200;

/// What a single poll observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    /// Status fetched
    Healthy,
    /// Fetch failed but the grace period has not run out
    Degraded,
    /// Fetch failed past the grace period; alert sent
    Alerted,
    /// Fetch failed and the alert for this outage was already sent
    Down,
}

/// Reconnect path taken from inside a poll
struct Recovery {
    connector: Arc<RetryingConnector>,
    prober: Arc<dyn Prober>,
}

/// Periodic health check with one alert per outage.
///
/// `connected` flips to false only when the alert fires, so later failed polls
/// stay quiet until a successful poll re-arms it.
///
/// With [`with_recovery`](Self::with_recovery), a failed poll runs the full
/// locked reconnect sequence and then asks once more, so the connector's
/// state tracks outages and recoveries.
pub struct HealthMonitor {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    config: SharedConfig,
    clock: Arc<dyn Clock>,
    interval: Duration,
    grace: chrono::Duration,
    state: Mutex<HealthState>,
    recovery: Option<Recovery>,
}

impl HealthMonitor {
    pub fn new(
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        config: SharedConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            notifier,
            config,
            clock,
            interval: CHECK_INTERVAL,
            grace: chrono::Duration::seconds(ALERT_GRACE_SECS),
            state: Mutex::new(HealthState::default()),
            recovery: None,
        }
    }

    pub fn with_recovery(mut self, connector: Arc<RetryingConnector>, prober: Arc<dyn Prober>) -> Self {
        self.recovery = Some(Recovery { connector, prober });
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> HealthState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one poll and apply the state machine
    pub async fn check_once(&self) -> HealthEvent {
        let status = self.poll().await;
        let now = self.clock.now();

        let should_alert = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

            if status.is_some() {
                if !state.connected {
                    tracing::info!("Server is reachable");
                }
                state.connected = true;
                state.last_success = Some(now);
                return HealthEvent::Healthy;
            }

            if !state.connected {
                return HealthEvent::Down;
            }

            match state.last_success {
                Some(last) if now - last > self.grace => {
                    state.connected = false;
                    true
                }
                _ => false,
            }
        };

        if !should_alert {
            tracing::warn!("Status poll failed, within grace period");
            return HealthEvent::Degraded;
        }

        let (target, host) = {
            let config = self.config.read().await;
            (config.alert_target.clone(), config.server_ip.clone())
        };
        let minutes = self.grace.num_minutes();
        let message = format!(
            "🚨 Server {} has been unreachable for more than {} minutes!",
            host, minutes
        );

        tracing::error!("{}", message);
        if target.is_empty() {
            tracing::warn!("alert_target is not set; alert not delivered");
        } else {
            self.notifier.deliver(&target, &message).await;
        }

        HealthEvent::Alerted
    }

    async fn poll(&self) -> Option<String> {
        let status = self.source.status().await;
        let Some(recovery) = &self.recovery else {
            return status;
        };

        match status {
            Some(status) => {
                // The collector may have reopened the session on its own
                if recovery.connector.state() != ConnectionState::Connected {
                    recovery.connector.connect_with_retry().await;
                }
                Some(status)
            }
            None => {
                let outcome = recovery.connector.reconnect(recovery.prober.as_ref()).await;
                if !outcome.ok {
                    tracing::warn!("Reconnect during health check failed: {}", outcome.message);
                    return None;
                }
                self.source.status().await
            }
        }
    }

    /// Poll forever at the configured interval
    pub async fn run(self: Arc<Self>) {
        tracing::info!("Health monitor started, polling every {:?}", self.interval);
        loop {
            tokio::time::sleep(self.interval).await;
            let event = self.check_once().await;
            tracing::debug!("Health check: {:?}", event);
        }
    }
}
