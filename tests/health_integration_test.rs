//! Integration tests for HealthMonitor's alerting state machine

mod common;

use chrono::{Duration, Utc};
use common::{FakeTransport, FixedProbe, Open, RecordingNotifier, SwitchableStatus};
use server_monitor::models::MonitorConfig;
use server_monitor::services::cache::{CachedStatus, StatusCache};
use server_monitor::services::collector::StatusCollector;
use server_monitor::services::config_service::SharedConfig;
use server_monitor::services::connector::RetryingConnector;
use server_monitor::services::health::{HealthEvent, HealthMonitor};
use server_monitor::services::session::RemoteSession;
use server_monitor::state::ConnectionState;
use server_monitor::utils::clock::ManualClock;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Fixture {
    source: Arc<SwitchableStatus>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
    monitor: Arc<HealthMonitor>,
}

fn fixture(alert_target: &str) -> Fixture {
    let mut config = MonitorConfig::new("10.0.0.5", "monitor");
    config.alert_target = alert_target.to_string();
    let config: SharedConfig = Arc::new(RwLock::new(config));

    let source = Arc::new(SwitchableStatus::new(true));
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let monitor = Arc::new(HealthMonitor::new(
        source.clone(),
        notifier.clone(),
        config,
        clock.clone(),
    ));

    Fixture {
        source,
        notifier,
        clock,
        monitor,
    }
}

impl Fixture {
    /// Advance five minutes and poll
    async fn poll(&self) -> HealthEvent {
        self.clock.advance(Duration::minutes(5));
        self.monitor.check_once().await
    }
}

#[tokio::test]
async fn test_single_failed_poll_does_not_alert() {
    let f = fixture("ops");

    assert_eq!(f.poll().await, HealthEvent::Healthy);
    f.source.set_up(false);
    assert_eq!(f.poll().await, HealthEvent::Degraded);

    assert!(f.notifier.messages().is_empty());
    assert!(f.monitor.state().connected);
}

#[tokio::test]
async fn test_one_alert_per_outage() {
    let f = fixture("ops");

    assert_eq!(f.poll().await, HealthEvent::Healthy);
    f.source.set_up(false);

    // 5, 10, 15 and 20 minutes since the last success: inside the grace period
    for _ in 0..4 {
        assert_eq!(f.poll().await, HealthEvent::Degraded);
    }
    // 25 minutes: alert
    assert_eq!(f.poll().await, HealthEvent::Alerted);
    // Still down, no repeat
    assert_eq!(f.poll().await, HealthEvent::Down);
    assert_eq!(f.poll().await, HealthEvent::Down);

    let messages = f.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "ops");
    assert_eq!(
        messages[0].1,
        "🚨 Server 10.0.0.5 has been unreachable for more than 20 minutes!"
    );
    assert!(!f.monitor.state().connected);
}

#[tokio::test]
async fn test_recovery_rearms_alert() {
    let f = fixture("ops");

    f.poll().await;
    f.source.set_up(false);
    for _ in 0..5 {
        f.poll().await;
    }
    assert_eq!(f.notifier.messages().len(), 1);

    f.source.set_up(true);
    assert_eq!(f.poll().await, HealthEvent::Healthy);
    let recovered_at = f.monitor.state().last_success;
    assert!(recovered_at.is_some());

    f.source.set_up(false);
    let events: Vec<HealthEvent> = {
        let mut events = Vec::new();
        for _ in 0..5 {
            events.push(f.poll().await);
        }
        events
    };

    assert_eq!(events.last(), Some(&HealthEvent::Alerted));
    assert_eq!(f.notifier.messages().len(), 2);
}

#[tokio::test]
async fn test_flapping_within_grace_never_alerts() {
    let f = fixture("ops");

    for round in 0..12 {
        f.source.set_up(round % 3 == 0);
        f.poll().await;
    }

    assert!(f.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_no_alert_before_first_success() {
    let f = fixture("ops");
    f.source.set_up(false);

    for _ in 0..12 {
        assert_eq!(f.poll().await, HealthEvent::Down);
    }
    assert!(f.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_missing_alert_target_still_flips_state() {
    let f = fixture("");

    f.poll().await;
    f.source.set_up(false);
    for _ in 0..5 {
        f.poll().await;
    }

    assert!(f.notifier.messages().is_empty());
    assert!(!f.monitor.state().connected);
    assert_eq!(f.poll().await, HealthEvent::Down);
}

#[tokio::test(start_paused = true)]
async fn test_run_polls_on_interval() {
    let f = fixture("ops");
    let handle = tokio::spawn(Arc::clone(&f.monitor).run());

    // No poll before the first interval elapses
    tokio::time::sleep(std::time::Duration::from_secs(299)).await;
    assert_eq!(f.source.calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(std::time::Duration::from_secs(302)).await;
    assert_eq!(f.source.calls.load(Ordering::SeqCst), 2);

    handle.abort();
}

// =============================================================================
// Reconnect Recovery Tests
// =============================================================================

struct Chain {
    transport: Arc<FakeTransport>,
    connector: Arc<RetryingConnector>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
    monitor: HealthMonitor,
}

/// Real session, collector and cache over a scripted transport
fn chain(transport: FakeTransport) -> Chain {
    let mut config = MonitorConfig::new("10.0.0.5", "monitor").with_password("pw");
    config.alert_target = "ops".to_string();
    let config: SharedConfig = Arc::new(RwLock::new(config));

    let transport = Arc::new(transport);
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let session = Arc::new(RemoteSession::new(transport.clone(), config.clone()));
    let connector = Arc::new(RetryingConnector::new(Arc::clone(&session), clock.clone()));
    let status = Arc::new(CachedStatus::new(
        Arc::new(StatusCollector::new(session)),
        Arc::new(StatusCache::in_memory()),
        config.clone(),
        clock.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = HealthMonitor::new(status, notifier.clone(), config, clock.clone())
        .with_recovery(Arc::clone(&connector), Arc::new(FixedProbe::up()));

    Chain {
        transport,
        connector,
        notifier,
        clock,
        monitor,
    }
}

impl Chain {
    async fn poll(&self) -> HealthEvent {
        self.clock.advance(Duration::minutes(5));
        self.monitor.check_once().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_outage_and_recovery_update_connection_state() {
    let c = chain(FakeTransport::new(Open::Ok));

    assert_eq!(c.poll().await, HealthEvent::Healthy);
    assert_eq!(c.connector.state(), ConnectionState::Connected);

    // Server goes away: the fetch fails and the retrying reconnect gives up
    c.transport.drop_connection();
    c.transport.set_default(Open::ConnectError);
    assert_eq!(c.poll().await, HealthEvent::Degraded);

    let status = c.connector.status();
    assert_eq!(status.state, ConnectionState::Disconnected);
    assert_eq!(status.consecutive_failures, 4);
    // One open from the fetch, four from the reconnect
    assert_eq!(c.transport.open_count(), 6);

    // Server is back
    c.transport.set_default(Open::Ok);
    assert_eq!(c.poll().await, HealthEvent::Healthy);

    let status = c.connector.status();
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(status.consecutive_failures, 0);
    assert!(c.notifier.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_inside_poll_rescues_failed_fetch() {
    let c = chain(FakeTransport::scripted(&[Open::Ok, Open::ConnectError], Open::Ok));

    assert_eq!(c.poll().await, HealthEvent::Healthy);
    c.transport.drop_connection();

    // The fetch's own reopen fails; the reconnect succeeds and the retry fetch
    // reports healthy
    assert_eq!(c.poll().await, HealthEvent::Healthy);
    assert_eq!(c.connector.state(), ConnectionState::Connected);
    assert_eq!(c.transport.open_count(), 3);
}
