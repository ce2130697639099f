// State management module
pub mod app_state;
pub mod connection_state;

pub use app_state::{AppOptions, AppState};
pub use connection_state::{ConnectionState, ConnectionStatus, HealthState};
