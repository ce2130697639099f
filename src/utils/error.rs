use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("SSH connection failed: {0}")]
    Connect(String),

    #[error("Unexpected inspection output: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

impl From<russh::Error> for MonitorError {
    fn from(e: russh::Error) -> Self {
        Self::Connect(e.to_string())
    }
}

impl MonitorError {
    /// Errors that no amount of retrying can fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Config(_))
    }

    /// Plain status text shown to users instead of the raw error
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication(_) => "authentication failed".to_string(),
            Self::Connect(_) => "cannot connect".to_string(),
            Self::Parse(_) => "server returned unexpected status output".to_string(),
            Self::Config(reason) => format!("configuration error: {}", reason),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(MonitorError::Authentication("denied".into()).is_fatal());
        assert!(MonitorError::Config("no credential".into()).is_fatal());
        assert!(!MonitorError::Connect("timed out".into()).is_fatal());
        assert!(!MonitorError::Parse("2 fields".into()).is_fatal());
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = MonitorError::Connect("os error 111".into());
        assert_eq!(err.user_message(), "cannot connect");

        let err = MonitorError::Authentication("publickey rejected".into());
        assert_eq!(err.user_message(), "authentication failed");
    }
}
