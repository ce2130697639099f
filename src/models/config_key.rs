use crate::utils::error::MonitorError;
use std::fmt;
use std::str::FromStr;

/// A single mutable configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ServerIp,
    SshPort,
    SshUsername,
    SshPassword,
    SshKeyPath,
    ReportTime,
    ReportTarget,
    AlertTarget,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        Self::ServerIp,
        Self::SshPort,
        Self::SshUsername,
        Self::SshPassword,
        Self::SshKeyPath,
        Self::ReportTime,
        Self::ReportTarget,
        Self::AlertTarget,
    ];

    /// Name of the persisted field
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::ServerIp => "server_ip",
            Self::SshPort => "ssh_port",
            Self::SshUsername => "ssh_username",
            Self::SshPassword => "ssh_password",
            Self::SshKeyPath => "ssh_key_path",
            Self::ReportTime => "report_time",
            Self::ReportTarget => "report_target",
            Self::AlertTarget => "alert_target",
        }
    }

    /// Short alias accepted by `set`
    pub fn alias(&self) -> &'static str {
        match self {
            Self::ServerIp => "ip",
            Self::SshPort => "port",
            Self::SshUsername => "user",
            Self::SshPassword => "pwd",
            Self::SshKeyPath => "key",
            Self::ReportTime => "report_time",
            Self::ReportTarget => "report_target",
            Self::AlertTarget => "alert_target",
        }
    }

    /// Fields that feed the connection digest
    pub fn is_connection_field(&self) -> bool {
        matches!(
            self,
            Self::ServerIp | Self::SshPort | Self::SshUsername | Self::SshPassword | Self::SshKeyPath
        )
    }
}

impl FromStr for ConfigKey {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.alias() == wanted || key.field_name() == wanted)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|k| k.alias()).collect();
                MonitorError::Config(format!(
                    "unknown key '{}', supported: {}",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
