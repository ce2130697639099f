use crate::models::ConnectionConfig;
use crate::services::config_service::SharedConfig;
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A live remote-shell connection
#[async_trait]
pub trait RemoteHandle: Send {
    fn is_open(&self) -> bool;

    /// Run a command and return its standard output
    async fn exec(&mut self, command: &str) -> Result<String>;

    async fn close(&mut self);
}

/// Opens remote-shell connections
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn RemoteHandle>>;
}

type HeldHandle = Option<Box<dyn RemoteHandle>>;

/// Owns the single connection to the monitored host.
///
/// Callers never hold the raw handle; they go through [`RemoteSession::acquire`]
/// and run commands on the returned guard.
pub struct RemoteSession {
    transport: Arc<dyn Transport>,
    config: SharedConfig,
    handle: Mutex<HeldHandle>,
    opened: AtomicU64,
}

impl RemoteSession {
    pub fn new(transport: Arc<dyn Transport>, config: SharedConfig) -> Self {
        Self {
            transport,
            config,
            handle: Mutex::new(None),
            opened: AtomicU64::new(0),
        }
    }

    /// Return the held connection if it is still open, otherwise open a new one.
    ///
    /// No retries happen here.
    pub async fn acquire(&self) -> Result<SessionGuard<'_>> {
        let mut held = self.handle.lock().await;

        if held.as_ref().is_some_and(|h| h.is_open()) {
            tracing::trace!("Reusing open SSH session");
            return Ok(SessionGuard { held });
        }

        let config = self.config.read().await.connection();
        config.validate()?;

        tracing::info!("Opening SSH session to {}", config.display_name());
        let handle = self.transport.open(&config).await?;

        // The previous handle, if any, is discarded here
        *held = Some(handle);
        self.opened.fetch_add(1, Ordering::Relaxed);

        Ok(SessionGuard { held })
    }

    /// Close and drop the held connection
    pub async fn invalidate(&self) {
        let mut held = self.handle.lock().await;
        if let Some(mut handle) = held.take() {
            handle.close().await;
            tracing::info!("SSH session closed");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.handle.lock().await.as_ref().is_some_and(|h| h.is_open())
    }

    /// Host of the current configuration
    pub async fn host(&self) -> String {
        self.config.read().await.server_ip.clone()
    }

    /// Number of connections opened over the lifetime of this session
    pub fn open_count(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

/// Exclusive access to the open connection
pub struct SessionGuard<'a> {
    held: MutexGuard<'a, HeldHandle>,
}

impl SessionGuard<'_> {
    pub async fn exec(&mut self, command: &str) -> Result<String> {
        match self.held.as_mut() {
            Some(handle) => handle.exec(command).await,
            None => Err(MonitorError::Connect("session is not open".to_string())),
        }
    }

    /// Drop the connection after a transport failure so the next acquire reopens
    pub async fn discard(mut self) {
        if let Some(mut handle) = self.held.take() {
            handle.close().await;
        }
    }
}
