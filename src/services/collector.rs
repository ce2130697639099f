use crate::models::{ServerStatus, INSPECTION_COMMAND};
use crate::services::session::RemoteSession;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Produces a fresh status report from the remote host.
///
/// `None` means no data; it never means "healthy with nothing to say".
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_fresh(&self) -> Option<String>;
}

/// Runs the inspection command over the shared session
pub struct StatusCollector {
    session: Arc<RemoteSession>,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl StatusCollector {
    pub fn new(session: Arc<RemoteSession>) -> Self {
        Self {
            session,
            connect_timeout: CONNECT_TIMEOUT,
            command_timeout: COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, command_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.command_timeout = command_timeout;
        self
    }

    /// Fetch and parse, keeping the typed result
    pub async fn collect(&self) -> Option<ServerStatus> {
        let mut guard = match timeout(self.connect_timeout, self.session.acquire()).await {
            Ok(Ok(guard)) => guard,
            Ok(Err(e)) => {
                tracing::warn!("Status fetch failed: {}", e);
                return None;
            }
            Err(_) => {
                tracing::warn!("Status fetch failed: connect timed out");
                return None;
            }
        };

        let result = timeout(self.command_timeout, guard.exec(INSPECTION_COMMAND)).await;
        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!("Inspection command failed: {}", e);
                guard.discard().await;
                return None;
            }
            Err(_) => {
                tracing::warn!("Inspection command timed out after {:?}", self.command_timeout);
                guard.discard().await;
                return None;
            }
        };

        match ServerStatus::parse(&output) {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}

#[async_trait]
impl StatusFetcher for StatusCollector {
    async fn fetch_fresh(&self) -> Option<String> {
        self.collect().await.map(|status| status.to_string())
    }
}
