use crate::models::parse_report_time;
use crate::services::cache::StatusSource;
use crate::services::config_service::SharedConfig;
use crate::services::notifier::Notifier;
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;

/// Wait before re-reading a malformed `report_time`
pub const FALLBACK_DELAY: Duration = Duration::from_secs(3600);

/// Next occurrence of `at`, strictly after `now`
pub fn next_fire(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Time to wait from `now` until the next occurrence of `at`
pub fn delay_until(at: NaiveTime, now: NaiveDateTime) -> Duration {
    (next_fire(at, now) - now).to_std().unwrap_or_default()
}

/// Report text; a failed fetch still produces a message
pub fn format_report(status: Option<&str>) -> String {
    match status {
        Some(status) => format!("📊 Server status report:\n{}", status),
        None => "❌ Cannot connect to the server".to_string(),
    }
}

/// Pushes a status report once a day at `report_time`
pub struct ReportScheduler {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    config: SharedConfig,
}

impl ReportScheduler {
    pub fn new(source: Arc<dyn StatusSource>, notifier: Arc<dyn Notifier>, config: SharedConfig) -> Self {
        Self {
            source,
            notifier,
            config,
        }
    }

    /// Fetch status and deliver the report. `None` sends to `report_target`.
    pub async fn push_report(&self, target: Option<&str>) -> String {
        let target = match target {
            Some(target) => target.to_string(),
            None => self.config.read().await.report_target.clone(),
        };

        let status = self.source.status().await;
        let report = format_report(status.as_deref());
        self.notifier.deliver(&target, &report).await;
        report
    }

    /// Fire forever at the configured time of day.
    ///
    /// The fire time is an absolute local timestamp; early wakeups sleep
    /// again for the remainder instead of firing.
    pub async fn run(self: Arc<Self>) {
        loop {
            let report_time = self.config.read().await.report_time.clone();
            let at = match parse_report_time(&report_time) {
                Ok(at) => at,
                Err(e) => {
                    tracing::error!("{}; retrying in {:?}", e, FALLBACK_DELAY);
                    tokio::time::sleep(FALLBACK_DELAY).await;
                    continue;
                }
            };

            let fire_at = next_fire(at, Local::now().naive_local());
            tracing::info!("Next status report at {}", fire_at);

            loop {
                let now = Local::now().naive_local();
                if now >= fire_at {
                    break;
                }
                tokio::time::sleep((fire_at - now).to_std().unwrap_or_default()).await;
            }

            self.push_report(None).await;
        }
    }
}
