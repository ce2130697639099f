pub mod auth;
pub mod config_key;
pub mod connection;
pub mod digest;
pub mod status;

// Re-export main types
pub use auth::AuthMethod;
pub use config_key::ConfigKey;
pub use connection::{parse_report_time, ConnectionConfig, MonitorConfig};
pub use digest::ConfigDigest;
pub use status::{ServerStatus, INSPECTION_COMMAND};
