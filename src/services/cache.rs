use crate::services::collector::StatusFetcher;
use crate::services::config_service::SharedConfig;
use crate::utils::clock::Clock;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// How long a fetched status stays fresh
pub const STATUS_TTL_SECS: i64 = 60;

/// One cached status, keyed by host in [`StatusCache`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

/// Per-host status cache with a fixed TTL.
///
/// Entries are never evicted; staleness is judged when read. Every write
/// rewrites the backing file when one is configured.
pub struct StatusCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl StatusCache {
    /// Cache without a backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            ttl: Duration::seconds(STATUS_TTL_SECS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Load from disk. A missing or unreadable file gives an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => {
                tracing::debug!("Loaded {} cached status entries", entries.len());
                entries
            }
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Ignoring unreadable status cache {:?}: {}", path, e);
                }
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            ttl: Duration::seconds(STATUS_TTL_SECS),
            entries: Mutex::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Result<HashMap<String, CacheEntry>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Cached status for `host` if it was captured less than TTL ago
    pub fn get(&self, host: &str, now: DateTime<Utc>) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(host)
            .filter(|entry| now - entry.timestamp < self.ttl)
            .map(|entry| entry.status.clone())
    }

    /// Overwrite the entry for `host` and persist
    pub fn put(&self, host: &str, status: &str, now: DateTime<Utc>) {
        let snapshot = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.insert(
                host.to_string(),
                CacheEntry {
                    timestamp: now,
                    status: status.to_string(),
                },
            );
            entries.clone()
        };

        if let Err(e) = self.persist(&snapshot) {
            tracing::warn!("Failed to persist status cache: {}", e);
        }
    }

    pub fn entries(&self) -> HashMap<String, CacheEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash never leaves a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Anything that can answer "what is the server's status right now"
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self) -> Option<String>;
}

/// A [`StatusFetcher`] fronted by a [`StatusCache`]
pub struct CachedStatus {
    fetcher: Arc<dyn StatusFetcher>,
    cache: Arc<StatusCache>,
    config: SharedConfig,
    clock: Arc<dyn Clock>,
}

impl CachedStatus {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        cache: Arc<StatusCache>,
        config: SharedConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            config,
            clock,
        }
    }

    async fn host_key(&self) -> String {
        self.config.read().await.server_ip.clone()
    }

    /// Skip the cache read, but still record a successful result.
    ///
    /// The entry is keyed by the host configured once the fetch returns, so a
    /// host change mid-fetch never files a status under the old host.
    pub async fn fresh_status(&self) -> Option<String> {
        let status = self.fetcher.fetch_fresh().await?;
        let host = self.host_key().await;
        self.cache.put(&host, &status, self.clock.now());
        Some(status)
    }
}

#[async_trait]
impl StatusSource for CachedStatus {
    async fn status(&self) -> Option<String> {
        let host = self.host_key().await;
        if let Some(cached) = self.cache.get(&host, self.clock.now()) {
            tracing::debug!("Using cached status for {}", host);
            return Some(cached);
        }
        self.fresh_status().await
    }
}
