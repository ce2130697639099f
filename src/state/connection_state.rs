use chrono::{DateTime, Utc};

/// Connection lifecycle as seen by the reconnect logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn display_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }
}

/// Connection state plus its bookkeeping.
///
/// Only mutated while the reconnect lock is held.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub last_success: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl ConnectionStatus {
    pub fn begin_attempt(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.state = ConnectionState::Connected;
        self.last_success = Some(at);
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

/// What the health monitor remembers between polls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthState {
    pub connected: bool,
    pub last_success: Option<DateTime<Utc>>,
}
