use crate::models::{AuthMethod, ConnectionConfig};
use crate::services::session::{RemoteHandle, Transport};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use russh::client::{self, AuthResult, Handle};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg, PublicKey};
use russh::{ChannelMsg, Disconnect};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Keepalive interval for an established session
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// SSH client session handle
pub type SshSession = Handle<SshClientHandler>;

/// SSH service for opening connections and running commands
pub struct SshService;

impl SshService {
    fn client_config() -> client::Config {
        client::Config {
            inactivity_timeout: Some(Duration::from_secs(300)),
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            keepalive_max: 3,
            ..<client::Config as Default>::default()
        }
    }

    /// Connect and authenticate using the configured credentials.
    ///
    /// Rejected credentials are reported as `Authentication`; everything that
    /// goes wrong on the wire is `Connect`.
    pub async fn connect(config: &ConnectionConfig) -> Result<SshSession> {
        let auth = config.auth_method()?;

        tracing::info!(
            "Connecting to {}:{} as {} ({} auth)",
            config.host,
            config.port,
            config.username,
            auth.label()
        );

        let mut session = client::connect(
            Arc::new(Self::client_config()),
            (config.host.as_str(), config.port),
            SshClientHandler,
        )
        .await
        .map_err(|e| MonitorError::Connect(e.to_string()))?;

        let auth_res = match &auth {
            AuthMethod::Password(password) => session
                .authenticate_password(config.username.as_str(), password.as_str())
                .await
                .map_err(|e| MonitorError::Connect(e.to_string()))?,
            AuthMethod::PublicKey { private_key_path } => {
                let key = Self::load_key(private_key_path).await?;
                let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), None);
                session
                    .authenticate_publickey(config.username.as_str(), key_with_alg)
                    .await
                    .map_err(|e| MonitorError::Connect(e.to_string()))?
            }
        };

        // In russh 0.55.0, AuthResult is an enum, not a bool
        if !matches!(auth_res, AuthResult::Success) {
            return Err(MonitorError::Authentication(format!(
                "{} authentication rejected for {}",
                auth.label(),
                config.username
            )));
        }

        tracing::info!("Successfully authenticated with {}", auth.label());
        Ok(session)
    }

    async fn load_key(path: &Path) -> Result<PrivateKey> {
        let key_data = tokio::fs::read_to_string(path).await.map_err(|e| {
            MonitorError::Authentication(format!("cannot read key {}: {}", path.display(), e))
        })?;

        PrivateKey::from_openssh(key_data.trim())
            .map_err(|e| MonitorError::Authentication(format!("Failed to load key: {}", e)))
    }

    /// Execute a command on the remote server, returning (stdout, stderr)
    pub async fn execute_command(session: &SshSession, command: &str) -> Result<(String, String)> {
        let mut channel = session.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { ref data }) => {
                    stdout.push_str(&String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    stderr.push_str(&String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    if exit_status != 0 {
                        tracing::debug!("Remote command exited with status {}", exit_status);
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                _ => {}
            }
        }

        Ok((stdout, stderr))
    }

    /// Disconnect from SSH server
    pub async fn disconnect(session: &SshSession) -> Result<()> {
        session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| MonitorError::Connect(format!("Disconnect failed: {}", e)))?;

        tracing::info!("Disconnected from SSH server");
        Ok(())
    }
}

/// russh handle wrapped for [`RemoteSession`](crate::services::session::RemoteSession)
pub struct SshHandle {
    session: SshSession,
}

#[async_trait]
impl RemoteHandle for SshHandle {
    fn is_open(&self) -> bool {
        !self.session.is_closed()
    }

    async fn exec(&mut self, command: &str) -> Result<String> {
        let (stdout, stderr) = SshService::execute_command(&self.session, command).await?;
        if !stderr.trim().is_empty() {
            tracing::debug!("Remote stderr: {}", stderr.trim());
        }
        Ok(stdout)
    }

    async fn close(&mut self) {
        if let Err(e) = SshService::disconnect(&self.session).await {
            tracing::debug!("{}", e);
        }
    }
}

/// Production transport backed by russh
#[derive(Debug, Default, Clone, Copy)]
pub struct SshTransport;

#[async_trait]
impl Transport for SshTransport {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn RemoteHandle>> {
        let session = SshService::connect(config).await?;
        Ok(Box::new(SshHandle { session }))
    }
}

/// SSH client handler. The monitored host's key is logged and accepted.
#[derive(Debug, Clone, Copy)]
pub struct SshClientHandler;

impl SshClientHandler {
    /// Calculate SHA256 fingerprint of a public key
    fn calculate_fingerprint(key: &PublicKey) -> String {
        use russh::keys::ssh_key::HashAlg;
        key.fingerprint(HashAlg::Sha256).to_string()
    }
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl std::future::Future<Output = std::result::Result<bool, Self::Error>> + Send {
        let fingerprint = Self::calculate_fingerprint(server_public_key);

        async move {
            tracing::debug!("Server key fingerprint: {}", fingerprint);
            Ok(true)
        }
    }
}
