// Services module
pub mod cache;
pub mod collector;
pub mod config_service;
pub mod connector;
pub mod guard;
pub mod health;
pub mod notifier;
pub mod probe;
pub mod report;
pub mod session;
pub mod ssh_service;
pub mod watcher;
