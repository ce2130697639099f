use super::{AuthMethod, ConfigKey};
use crate::utils::error::{MonitorError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;

/// Persisted monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Monitored host address
    #[serde(default)]
    pub server_ip: String,

    /// SSH port (default: 22)
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default)]
    pub ssh_username: String,

    #[serde(default)]
    pub ssh_password: Option<String>,

    /// Path to an OpenSSH private key, preferred over the password
    #[serde(default)]
    pub ssh_key_path: Option<PathBuf>,

    /// Daily report time, `HH:MM` local time
    #[serde(default = "default_report_time")]
    pub report_time: String,

    /// Where daily reports are delivered
    #[serde(default)]
    pub report_target: String,

    /// Where disconnect alerts are delivered
    #[serde(default)]
    pub alert_target: String,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_report_time() -> String {
    "09:00".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server_ip: String::new(),
            ssh_port: default_ssh_port(),
            ssh_username: String::new(),
            ssh_password: None,
            ssh_key_path: None,
            report_time: default_report_time(),
            report_target: String::new(),
            alert_target: String::new(),
        }
    }
}

impl MonitorConfig {
    pub fn new(server_ip: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            server_ip: server_ip.into(),
            ssh_username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.ssh_password = Some(password.into());
        self
    }

    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_key_path = Some(path.into());
        self
    }

    /// The connection-relevant subset
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.server_ip.clone(),
            port: self.ssh_port,
            username: self.ssh_username.clone(),
            password: self.ssh_password.clone(),
            key_path: self.ssh_key_path.clone(),
        }
    }

    /// Apply a single field update. Values are validated before anything changes.
    pub fn apply(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            ConfigKey::ServerIp => self.server_ip = value.to_string(),
            ConfigKey::SshPort => {
                let port = value.parse::<u16>().map_err(|_| {
                    MonitorError::Config(format!("port must be an integer in 1-65535, got '{}'", value))
                })?;
                if port == 0 {
                    return Err(MonitorError::Config("port must not be 0".to_string()));
                }
                self.ssh_port = port;
            }
            ConfigKey::SshUsername => self.ssh_username = value.to_string(),
            ConfigKey::SshPassword => self.ssh_password = non_empty(value),
            ConfigKey::SshKeyPath => self.ssh_key_path = non_empty(value).map(PathBuf::from),
            ConfigKey::ReportTime => {
                parse_report_time(value)?;
                self.report_time = value.to_string();
            }
            ConfigKey::ReportTarget => self.report_target = value.to_string(),
            ConfigKey::AlertTarget => self.alert_target = value.to_string(),
        }
        Ok(())
    }

    /// Current value of a field as `set` would accept it; unset is empty
    pub fn raw_value(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::ServerIp => self.server_ip.clone(),
            ConfigKey::SshPort => self.ssh_port.to_string(),
            ConfigKey::SshUsername => self.ssh_username.clone(),
            ConfigKey::SshPassword => self.ssh_password.clone().unwrap_or_default(),
            ConfigKey::SshKeyPath => self
                .ssh_key_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            ConfigKey::ReportTime => self.report_time.clone(),
            ConfigKey::ReportTarget => self.report_target.clone(),
            ConfigKey::AlertTarget => self.alert_target.clone(),
        }
    }

    /// Current value of a field for display, with the password masked
    pub fn display_value(&self, key: ConfigKey) -> String {
        let value = match key {
            ConfigKey::ServerIp => non_empty(&self.server_ip),
            ConfigKey::SshPort => Some(self.ssh_port.to_string()),
            ConfigKey::SshUsername => non_empty(&self.ssh_username),
            ConfigKey::SshPassword => self.ssh_password.as_ref().map(|_| "***".to_string()),
            ConfigKey::SshKeyPath => self.ssh_key_path.as_ref().map(|p| p.display().to_string()),
            ConfigKey::ReportTime => non_empty(&self.report_time),
            ConfigKey::ReportTarget => non_empty(&self.report_target),
            ConfigKey::AlertTarget => non_empty(&self.alert_target),
        };
        value.unwrap_or_else(|| "not set".to_string())
    }

    /// Read-only dump used by `show`
    pub fn display_lines(&self) -> Vec<String> {
        ConfigKey::ALL
            .iter()
            .map(|key| format!("{}: {}", key.field_name(), self.display_value(*key)))
            .collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an `HH:MM` wall-clock time
pub fn parse_report_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        MonitorError::Config(format!("report_time must be HH:MM, got '{}'", value))
    })
}

/// Connection parameters for the monitored host
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub key_path: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Pick the credential to authenticate with.
    ///
    /// A key is used only if the file exists and can be opened; otherwise the
    /// password is used. Neither usable is a configuration error.
    pub fn auth_method(&self) -> Result<AuthMethod> {
        if let Some(path) = &self.key_path {
            if path.is_file() && File::open(path).is_ok() {
                return Ok(AuthMethod::public_key(path.clone()));
            }
            tracing::warn!("Key file {} is not readable, falling back to password", path.display());
        }

        match &self.password {
            Some(password) if !password.is_empty() => Ok(AuthMethod::Password(password.clone())),
            _ => Err(MonitorError::Config(
                "no usable SSH key or password configured".to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MonitorError::Config("server_ip is not set".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(MonitorError::Config("ssh_username is not set".to_string()));
        }
        Ok(())
    }

    /// Get a display string for the connection
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_path", &self.key_path)
            .finish()
    }
}
