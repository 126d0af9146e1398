// src/config.rs
// =============================================================================
// Settings that are not part of a single crawl request.
//
// A crawl request only says "where, how deep, how many at once". Everything
// else (timeouts, user agent, channel sizes, where the API listens) lives
// here and can be overridden with a JSON file:
//
//   {
//     "crawler": { "request_timeout_secs": 20 },
//     "server":  { "listen_addr": "0.0.0.0:8000" }
//   }
//
// Every field has a default, so a partial file (or no file) is fine.
// =============================================================================

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawler: CrawlerSettings,
    pub server: ServerSettings,
}

/// How pages are fetched and handed to storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    pub max_redirects: usize,
    /// Fetched pages that may wait for the storage writer before workers block
    pub relay_capacity: usize,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("crawl-keeper/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 10,
            max_redirects: 10,
            relay_capacity: 256,
        }
    }
}

/// HTTP API settings for the `serve` subcommand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen_addr: String,
    /// Crawl jobs allowed to run at the same time; extra jobs wait their turn
    pub max_active_jobs: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            max_active_jobs: 4,
        }
    }
}

impl Settings {
    // Loads settings from a JSON file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                let settings: Settings = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?;
                debug!(path = %path.display(), "loaded configuration");
                settings
            }
            None => Settings::default(),
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.crawler.request_timeout_secs == 0 {
            bail!("crawler.request_timeout_secs must be at least 1");
        }
        if self.crawler.relay_capacity == 0 {
            bail!("crawler.relay_capacity must be at least 1");
        }
        if self.server.max_active_jobs == 0 {
            bail!("server.max_active_jobs must be at least 1");
        }
        Ok(())
    }
}
