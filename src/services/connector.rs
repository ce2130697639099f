use crate::services::probe::Prober;
use crate::services::session::RemoteSession;
use crate::state::{ConnectionState, ConnectionStatus};
use crate::utils::clock::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Bounded retry policy for establishing the SSH session
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Total time budget across all attempts
    pub time_budget: Duration,
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            time_budget: Duration::from_secs(120),
            retry_delay: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of a reconnect sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub ok: bool,
    pub message: String,
    /// Connect attempts made; 0 when the probe ruled the host out
    pub attempts: u32,
}

impl ConnectOutcome {
    fn success(message: String, attempts: u32) -> Self {
        Self {
            ok: true,
            message,
            attempts,
        }
    }

    fn failure(message: String, attempts: u32) -> Self {
        Self {
            ok: false,
            message,
            attempts,
        }
    }
}

/// Retries [`RemoteSession::acquire`] under a single reconnect lock.
///
/// Every path that (re)connects goes through this lock, so a background
/// reconnect and a configuration-triggered one never interleave.
pub struct RetryingConnector {
    session: Arc<RemoteSession>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    reconnect_lock: tokio::sync::Mutex<()>,
    status: Mutex<ConnectionStatus>,
}

impl RetryingConnector {
    pub fn new(session: Arc<RemoteSession>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(session, clock, RetryPolicy::default())
    }

    pub fn with_policy(session: Arc<RemoteSession>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            session,
            policy,
            clock,
            reconnect_lock: tokio::sync::Mutex::new(()),
            status: Mutex::new(ConnectionStatus::default()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Snapshot of the connection state
    pub fn status(&self) -> ConnectionStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn update_status(&self, f: impl FnOnce(&mut ConnectionStatus)) {
        match self.status.lock() {
            Ok(mut status) => f(&mut status),
            Err(e) => f(&mut e.into_inner()),
        }
    }

    /// Connect with bounded retry, no reachability pre-check
    pub async fn connect_with_retry(&self) -> ConnectOutcome {
        let _lock = self.reconnect_lock.lock().await;
        self.connect_locked().await
    }

    /// Full reconnect sequence: probe, then connect with retry.
    ///
    /// The probe does not count against the retry budget.
    pub async fn reconnect(&self, prober: &dyn Prober) -> ConnectOutcome {
        self.reconnect_inner(prober, false).await
    }

    /// Same as [`reconnect`](Self::reconnect), but drops the current session
    /// first because its configuration is stale.
    pub async fn reconnect_fresh(&self, prober: &dyn Prober) -> ConnectOutcome {
        self.reconnect_inner(prober, true).await
    }

    async fn reconnect_inner(&self, prober: &dyn Prober, invalidate: bool) -> ConnectOutcome {
        let _lock = self.reconnect_lock.lock().await;

        if invalidate {
            self.session.invalidate().await;
            self.update_status(|s| s.mark_disconnected());
        }

        let host = self.session.host().await;
        let probe = prober.probe(&host).await;
        if !probe.reachable {
            tracing::warn!("Host {} is unreachable, skipping connect", host);
            self.update_status(|s| s.mark_disconnected());
            return ConnectOutcome::failure(format!("host {} is unreachable", host), 0);
        }

        tracing::debug!("Host {} answered ping in {:.1} ms", host, probe.rtt_ms);
        self.connect_locked().await
    }

    /// Caller must hold `reconnect_lock`
    async fn connect_locked(&self) -> ConnectOutcome {
        let started = Instant::now();
        let mut attempts = 0;

        self.update_status(|s| s.begin_attempt());

        while attempts < self.policy.max_attempts && started.elapsed() < self.policy.time_budget {
            attempts += 1;

            let failure =
                match tokio::time::timeout(self.policy.connect_timeout, self.session.acquire()).await {
                    Ok(Ok(_guard)) => {
                        let now = self.clock.now();
                        self.update_status(|s| s.record_success(now));
                        tracing::info!("SSH session ready after {} attempt(s)", attempts);
                        return ConnectOutcome::success(
                            format!("connected after {} attempt(s)", attempts),
                            attempts,
                        );
                    }
                    Ok(Err(e)) if e.is_fatal() => {
                        tracing::error!("Giving up on attempt {}: {}", attempts, e);
                        self.update_status(|s| {
                            s.record_failure();
                            s.mark_disconnected();
                        });
                        return ConnectOutcome::failure(e.user_message(), attempts);
                    }
                    Ok(Err(e)) => e.to_string(),
                    Err(_) => format!("connect timed out after {:?}", self.policy.connect_timeout),
                };

            self.update_status(|s| s.record_failure());
            tracing::warn!(
                "Connect attempt {}/{} failed: {}",
                attempts,
                self.policy.max_attempts,
                failure
            );

            if attempts >= self.policy.max_attempts {
                break;
            }
            if started.elapsed() + self.policy.retry_delay >= self.policy.time_budget {
                tracing::warn!("Retry budget of {:?} exhausted", self.policy.time_budget);
                break;
            }
            tokio::time::sleep(self.policy.retry_delay).await;
        }

        self.update_status(|s| s.mark_disconnected());
        ConnectOutcome::failure(
            format!("cannot connect after {} attempt(s)", attempts),
            attempts,
        )
    }

    pub fn state(&self) -> ConnectionState {
        self.status().state
    }
}
