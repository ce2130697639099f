use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of a reachability probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub reachable: bool,
    pub rtt_ms: f64,
}

impl ProbeResult {
    pub fn reachable(rtt_ms: f64) -> Self {
        Self {
            reachable: true,
            rtt_ms,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            rtt_ms: 0.0,
        }
    }
}

/// Network-layer liveness check, independent of SSH
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &str) -> ProbeResult;
}

/// ICMP echo via the system `ping` tool
#[derive(Debug, Clone)]
pub struct PingProbe {
    count: u32,
    per_probe_timeout: Duration,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self {
            count: 3,
            per_probe_timeout: Duration::from_secs(1),
        }
    }
}

impl PingProbe {
    pub fn new(count: u32, per_probe_timeout: Duration) -> Self {
        Self {
            count: count.max(1),
            per_probe_timeout,
        }
    }

    fn command(&self, host: &str) -> Command {
        let mut cmd = Command::new("ping");
        cmd.arg("-c").arg(self.count.to_string());

        // BSD ping takes -W in milliseconds, iputils in seconds
        if cfg!(target_os = "macos") {
            cmd.arg("-W").arg(self.per_probe_timeout.as_millis().to_string());
        } else {
            cmd.arg("-W").arg(self.per_probe_timeout.as_secs().max(1).to_string());
        }

        cmd.arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Prober for PingProbe {
    async fn probe(&self, host: &str) -> ProbeResult {
        // Hard ceiling in case the tool ignores -W
        let ceiling = self.per_probe_timeout * (self.count + 2);

        let output = match tokio::time::timeout(ceiling, self.command(host).output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!("Failed to run ping for {}: {}", host, e);
                return ProbeResult::unreachable();
            }
            Err(_) => {
                tracing::warn!("Ping to {} did not finish within {:?}", host, ceiling);
                return ProbeResult::unreachable();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_ping_summary(&stdout) {
            Some(avg) => {
                tracing::debug!("Ping {}: avg rtt {:.2} ms", host, avg);
                ProbeResult::reachable(avg)
            }
            None => {
                tracing::info!("Host {} did not answer ping", host);
                ProbeResult::unreachable()
            }
        }
    }
}

/// Always reports reachable; used when ping is unavailable or disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

#[async_trait]
impl Prober for NoProbe {
    async fn probe(&self, _host: &str) -> ProbeResult {
        ProbeResult::reachable(0.0)
    }
}

/// Extract the average RTT from ping's summary line.
///
/// Handles `rtt min/avg/max/mdev = ...` (iputils) and
/// `round-trip min/avg/max/stddev = ...` (BSD, busybox).
pub fn parse_ping_summary(output: &str) -> Option<f64> {
    let line = output.lines().find(|line| line.contains("min/avg/max"))?;
    let (_, values) = line.split_once('=')?;
    values
        .trim()
        .split('/')
        .nth(1)?
        .trim()
        .parse::<f64>()
        .ok()
}
