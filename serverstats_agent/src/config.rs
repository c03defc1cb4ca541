//! Environment-driven configuration. Only the state directory and database
//! are load-bearing at startup; everything else falls back to a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

/// Sampling interval floor and default, in seconds.
const MIN_INTERVAL_SECS: u64 = 10;
const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Rolling window shown by the dashboard.
pub const WINDOW_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub endpoint: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_name: String,
    pub interval: Duration,
    pub state_dir: PathBuf,
    pub db_path: PathBuf,
    pub roster: Option<RosterConfig>,
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("serverstats_agent")
}

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server_name = match env_trimmed("SERVERSTATS_NAME") {
            Some(name) => name,
            None => hostname::get()
                .context("resolve host name")?
                .to_string_lossy()
                .to_string(),
        };

        let interval_secs = env_trimmed("SERVERSTATS_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v >= MIN_INTERVAL_SECS)
            .unwrap_or(DEFAULT_INTERVAL_SECS);

        let state_dir = env_trimmed("SERVERSTATS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir);

        let db_path = env_trimmed("SERVERSTATS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| state_dir.join("stats.db"));

        // Both endpoint and secret are required; absence of either disables
        // session reconciliation.
        let roster = match (
            env_trimmed("SERVERSTATS_ROSTER_URL"),
            env_trimmed("SERVERSTATS_ROSTER_SECRET"),
        ) {
            (Some(endpoint), Some(secret)) => Some(RosterConfig { endpoint, secret }),
            _ => None,
        };

        Ok(Self {
            server_name,
            interval: Duration::from_secs(interval_secs),
            state_dir,
            db_path,
            roster,
        })
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.state_dir.join("samples")
    }
}
