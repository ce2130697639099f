use crate::utils::error::{MonitorError, Result};
use std::fmt;

/// Shell command run on the monitored host.
///
/// Prints exactly four lines: hostname, human-readable uptime, memory used
/// percent (MemTotal vs MemAvailable) and root filesystem used percent.
pub const INSPECTION_COMMAND: &str = concat!(
    "hostname; ",
    "uptime -p 2>/dev/null || uptime; ",
    "awk '/^MemTotal:/{t=$2} /^MemAvailable:/{a=$2} END{if(t>0) printf \"%.1f\\n\", (t-a)*100/t}' /proc/meminfo; ",
    "df -P / | awk 'NR==2{print $5}'",
);

/// Parsed result of one inspection run
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    pub hostname: String,
    pub uptime: String,
    pub memory_used_pct: f64,
    pub disk_used_pct: f64,
}

impl ServerStatus {
    /// Parse the four newline-delimited fields of the inspection output.
    ///
    /// Anything short of four well-formed fields is rejected as a whole.
    pub fn parse(output: &str) -> Result<Self> {
        let fields: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if fields.len() < 4 {
            return Err(MonitorError::Parse(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        }

        Ok(Self {
            hostname: fields[0].to_string(),
            uptime: fields[1].to_string(),
            memory_used_pct: parse_percent(fields[2], "memory")?,
            disk_used_pct: parse_percent(fields[3], "disk")?,
        })
    }
}

fn parse_percent(field: &str, what: &str) -> Result<f64> {
    field
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| MonitorError::Parse(format!("{} usage '{}' is not a percentage", what, field)))
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hostname: {}", self.hostname)?;
        writeln!(f, "Uptime: {}", self.uptime)?;
        writeln!(f, "Memory used: {:.1}%", self.memory_used_pct)?;
        write!(f, "Disk used (/): {:.0}%", self.disk_used_pct)
    }
}
