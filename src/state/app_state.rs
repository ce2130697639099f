use crate::models::ConfigKey;
use crate::services::cache::{CachedStatus, StatusCache, StatusSource};
use crate::services::collector::StatusCollector;
use crate::services::config_service::ConfigService;
use crate::services::connector::{ConnectOutcome, RetryingConnector};
use crate::services::guard::ConfigChangeGuard;
use crate::services::health::HealthMonitor;
use crate::services::notifier::{LogNotifier, Notifier};
use crate::services::probe::{NoProbe, PingProbe, Prober, ProbeResult};
use crate::services::report::ReportScheduler;
use crate::services::session::{RemoteSession, Transport};
use crate::services::ssh_service::SshTransport;
use crate::services::watcher::ConfigWatcher;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::Result;
use std::sync::Arc;

/// Startup options
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    /// Use ICMP ping before reconnecting
    pub probe: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self { probe: true }
    }
}

/// Application global state: every component, wired together once
pub struct AppState {
    pub config_service: Arc<ConfigService>,
    pub session: Arc<RemoteSession>,
    pub connector: Arc<RetryingConnector>,
    pub status: Arc<CachedStatus>,
    pub prober: Arc<dyn Prober>,
    pub guard: Arc<ConfigChangeGuard>,
    pub health: Arc<HealthMonitor>,
    pub reports: Arc<ReportScheduler>,
    pub watcher: Arc<ConfigWatcher>,
}

impl AppState {
    /// Production wiring: russh transport, system ping, stdout delivery
    pub fn new(config_service: ConfigService, options: AppOptions) -> Self {
        let prober: Arc<dyn Prober> = if options.probe {
            Arc::new(PingProbe::default())
        } else {
            Arc::new(NoProbe)
        };
        let cache = StatusCache::load(config_service.cache_file());

        Self::with_parts(
            config_service,
            Arc::new(SshTransport),
            prober,
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
            cache,
        )
    }

    pub fn with_parts(
        config_service: ConfigService,
        transport: Arc<dyn Transport>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        cache: StatusCache,
    ) -> Self {
        let config_service = Arc::new(config_service);
        let shared = config_service.shared();

        let session = Arc::new(RemoteSession::new(transport, shared.clone()));
        let connector = Arc::new(RetryingConnector::new(Arc::clone(&session), clock.clone()));
        let collector = Arc::new(StatusCollector::new(Arc::clone(&session)));
        let status = Arc::new(CachedStatus::new(
            collector,
            Arc::new(cache),
            shared.clone(),
            clock.clone(),
        ));

        let source: Arc<dyn StatusSource> = status.clone();
        let health = Arc::new(
            HealthMonitor::new(source.clone(), notifier.clone(), shared.clone(), clock)
                .with_recovery(Arc::clone(&connector), prober.clone()),
        );
        let reports = Arc::new(ReportScheduler::new(source, notifier, shared));
        let guard = Arc::new(ConfigChangeGuard::new(
            Arc::clone(&config_service),
            Arc::clone(&connector),
            prober.clone(),
        ));
        let watcher = Arc::new(ConfigWatcher::new(
            Arc::clone(&config_service),
            Arc::clone(&guard),
        ));

        Self {
            config_service,
            session,
            connector,
            status,
            prober,
            guard,
            health,
            reports,
            watcher,
        }
    }

    /// "show current status"
    pub async fn show_status(&self, fresh: bool) -> String {
        let status = if fresh {
            self.status.fresh_status().await
        } else {
            self.status.status().await
        };

        match status {
            Some(status) => format!("✅ Server connection OK:\n{}", status),
            None => "❌ Server connection failed, check SSH settings or network".to_string(),
        }
    }

    /// "push a report now"
    pub async fn push_report(&self, target: Option<&str>) -> String {
        self.reports.push_report(target).await
    }

    /// "show configuration", password masked
    pub async fn show_config(&self) -> String {
        let config = self.config_service.snapshot().await;
        let mut lines = vec!["📄 Current configuration:".to_string()];
        lines.extend(config.display_lines());
        lines.join("\n")
    }

    /// Apply one setting and wait for any reconnect it triggers
    pub async fn set(&self, key: ConfigKey, value: &str) -> Result<String> {
        let outcome = self.guard.set(key, value).await?;
        let keys: Vec<String> = outcome.keys.iter().map(|k| k.to_string()).collect();
        let mut message = format!("✅ Updated {}", keys.join(", "));

        if let Some(reconnect) = outcome.wait().await {
            let mark = if reconnect.ok { "✅" } else { "❌" };
            message.push_str(&format!("\n{} {}", mark, reconnect.message));
        }
        Ok(message)
    }

    pub async fn probe(&self) -> ProbeResult {
        let host = self.session.host().await;
        self.prober.probe(&host).await
    }

    /// Reachability-gated reconnect, same path as a config change uses
    pub async fn reconnect(&self) -> ConnectOutcome {
        self.connector.reconnect(self.prober.as_ref()).await
    }

    /// Start the background tasks and block until Ctrl-C
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let initial = self.reconnect().await;
        if initial.ok {
            tracing::info!("Initial connection: {}", initial.message);
        } else {
            tracing::warn!("Initial connection failed: {}", initial.message);
        }

        let health = tokio::spawn(Arc::clone(&self.health).run());
        let reports = tokio::spawn(Arc::clone(&self.reports).run());
        let watcher = tokio::spawn(Arc::clone(&self.watcher).run());

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down");

        health.abort();
        reports.abort();
        watcher.abort();
        self.session.invalidate().await;
        Ok(())
    }
}
