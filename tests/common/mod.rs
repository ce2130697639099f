//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use server_monitor::models::ConnectionConfig;
use server_monitor::services::cache::StatusSource;
use server_monitor::services::collector::StatusFetcher;
use server_monitor::services::notifier::Notifier;
use server_monitor::services::probe::{ProbeResult, Prober};
use server_monitor::services::session::{RemoteHandle, Transport};
use server_monitor::utils::error::{MonitorError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GOOD_OUTPUT: &str = "web-01\nup 5 days, 2 hours\n37.5\n58%\n";

/// What the next `open` call should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Open {
    Ok,
    ConnectError,
    AuthError,
}

/// Scripted transport: pops one `Open` per call, falling back to `default`
pub struct FakeTransport {
    script: Mutex<VecDeque<Open>>,
    default: Mutex<Open>,
    output: Arc<Mutex<std::result::Result<String, String>>>,
    pub opens: AtomicUsize,
    pub execs: Arc<AtomicUsize>,
    last_handle: Mutex<Option<Arc<AtomicBool>>>,
}

impl FakeTransport {
    pub fn new(default: Open) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(default),
            output: Arc::new(Mutex::new(Ok(GOOD_OUTPUT.to_string()))),
            opens: AtomicUsize::new(0),
            execs: Arc::new(AtomicUsize::new(0)),
            last_handle: Mutex::new(None),
        }
    }

    pub fn scripted(script: &[Open], default: Open) -> Self {
        let transport = Self::new(default);
        transport.script.lock().unwrap().extend(script.iter().copied());
        transport
    }

    /// Change what `open` does once the script runs out
    pub fn set_default(&self, default: Open) {
        *self.default.lock().unwrap() = default;
    }

    pub fn set_output(&self, output: &str) {
        *self.output.lock().unwrap() = Ok(output.to_string());
    }

    pub fn fail_exec(&self, reason: &str) {
        *self.output.lock().unwrap() = Err(reason.to_string());
    }

    /// Simulate the server dropping the most recent connection
    pub fn drop_connection(&self) {
        if let Some(open) = self.last_handle.lock().unwrap().as_ref() {
            open.store(false, Ordering::SeqCst);
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn exec_count(&self) -> usize {
        self.execs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&self, _config: &ConnectionConfig) -> Result<Box<dyn RemoteHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let next = next.unwrap_or(*self.default.lock().unwrap());

        match next {
            Open::Ok => {
                let open = Arc::new(AtomicBool::new(true));
                *self.last_handle.lock().unwrap() = Some(Arc::clone(&open));
                Ok(Box::new(FakeHandle {
                    open,
                    output: Arc::clone(&self.output),
                    execs: Arc::clone(&self.execs),
                }))
            }
            Open::ConnectError => Err(MonitorError::Connect("connection refused".to_string())),
            Open::AuthError => Err(MonitorError::Authentication("password rejected".to_string())),
        }
    }
}

pub struct FakeHandle {
    open: Arc<AtomicBool>,
    output: Arc<Mutex<std::result::Result<String, String>>>,
    execs: Arc<AtomicUsize>,
}

#[async_trait]
impl RemoteHandle for FakeHandle {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn exec(&mut self, _command: &str) -> Result<String> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        let output = self.output.lock().unwrap().clone();
        output.map_err(MonitorError::Connect)
    }

    async fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Prober with a fixed answer that counts calls
pub struct FixedProbe {
    reachable: bool,
    pub calls: AtomicUsize,
}

impl FixedProbe {
    pub fn up() -> Self {
        Self {
            reachable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            reachable: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Prober for FixedProbe {
    async fn probe(&self, _host: &str) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            ProbeResult::reachable(1.5)
        } else {
            ProbeResult::unreachable()
        }
    }
}

/// Notifier that records every delivery
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, target: &str, text: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
    }
}

/// Status source whose answer is switched by the test
pub struct SwitchableStatus {
    pub up: AtomicBool,
    pub calls: AtomicUsize,
}

impl SwitchableStatus {
    pub fn new(up: bool) -> Self {
        Self {
            up: AtomicBool::new(up),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusSource for SwitchableStatus {
    async fn status(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.up.load(Ordering::SeqCst) {
            Some("Hostname: web-01".to_string())
        } else {
            None
        }
    }
}

/// Fetcher that counts remote round-trips
pub struct CountingFetcher {
    pub fetches: AtomicUsize,
    pub up: AtomicBool,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            up: AtomicBool::new(true),
        }
    }

    pub fn count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusFetcher for CountingFetcher {
    async fn fetch_fresh(&self) -> Option<String> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.up.load(Ordering::SeqCst) {
            Some(format!("status #{}", n))
        } else {
            None
        }
    }
}
