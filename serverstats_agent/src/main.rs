use std::fs;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use serverstats_agent::config::{Config, WINDOW_MINUTES};
use serverstats_agent::engine::{Engine, EngineConfig};
use serverstats_agent::metrics::SysinfoMetrics;
use serverstats_agent::roster::HttpRosterClient;
use serverstats_agent::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env()?;
    let samples_dir = cfg.samples_dir();
    fs::create_dir_all(&samples_dir)
        .with_context(|| format!("create samples directory {}", samples_dir.display()))?;

    let store = SqliteStore::open(&cfg.db_path)?;
    let metrics = SysinfoMetrics::new();
    let roster = match &cfg.roster {
        Some(r) => Some(HttpRosterClient::new(&r.endpoint, &r.secret)?),
        None => None,
    };

    info!(
        "serverstats_agent v{} started: server={}, interval={}s, roster_enabled={}",
        env!("CARGO_PKG_VERSION"),
        cfg.server_name,
        cfg.interval.as_secs(),
        roster.is_some()
    );

    let engine_cfg = EngineConfig {
        server_name: cfg.server_name.clone(),
        samples_dir,
        window: ChronoDuration::minutes(WINDOW_MINUTES),
    };
    let mut engine = Engine::new(engine_cfg, metrics, roster, store, Utc::now());
    engine.recover_pending();

    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First interval tick fires immediately; skip it so the CPU counters
    // have a full interval to accumulate before the first sample.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick(Utc::now()).await;
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("ctrl-c handler failed: {e}");
                }
                info!("serverstats_agent stopped");
                return Ok(());
            }
        }
    }
}
