use async_trait::async_trait;

/// Out-of-band message delivery.
///
/// Delivery outcome is not reported back; monitoring does not depend on it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, target: &str, text: &str);
}

/// Prints messages to stdout and the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, target: &str, text: &str) {
        let target = if target.is_empty() { "stdout" } else { target };
        tracing::info!(target: "server_monitor::delivery", to = target, "{}", text);
        println!("{} {}", console::style(format!("[{}]", target)).cyan(), text);
    }
}
