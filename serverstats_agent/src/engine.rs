//! The tick engine: the only stateful coordinator. `tick(now)` drives hour
//! rollover, sampling, the durable log, the rolling window, session
//! reconciliation and store synchronization. Collaborator failures are
//! reported and never propagate past the tick.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::aggregate::aggregate_hour;
use crate::hourlog::{bucket_of, hour_file_path, pending_buckets, read_samples, HourLog};
use crate::metrics::MetricsSource;
use crate::roster::RosterClient;
use crate::sessions::{SessionDelta, SessionLedger};
use crate::store::StatsStore;
use crate::window::{window_point, RecentWindow};

pub struct EngineConfig {
    pub server_name: String,
    pub samples_dir: PathBuf,
    pub window: Duration,
}

pub struct Engine<M, R, S> {
    cfg: EngineConfig,
    metrics: M,
    roster: Option<R>,
    store: S,
    log: HourLog,
    window: RecentWindow,
    ledger: SessionLedger,
}

impl<M, R, S> Engine<M, R, S>
where
    M: MetricsSource,
    R: RosterClient,
    S: StatsStore,
{
    pub fn new(cfg: EngineConfig, metrics: M, roster: Option<R>, store: S, start: DateTime<Utc>) -> Self {
        let log = HourLog::open(&cfg.samples_dir, bucket_of(start));
        let window = RecentWindow::new(cfg.window);
        Self {
            cfg,
            metrics,
            roster,
            store,
            log,
            window,
            ledger: SessionLedger::new(),
        }
    }

    pub fn current_bucket(&self) -> DateTime<Utc> {
        self.log.bucket_start()
    }

    pub fn hour_log(&self) -> &HourLog {
        &self.log
    }

    pub fn window(&self) -> &RecentWindow {
        &self.window
    }

    pub fn open_sessions(&self) -> usize {
        self.ledger.open_count()
    }

    /// Roll up hour files left behind by an earlier run. Called once before
    /// the tick loop starts; a file survives until its aggregate reaches
    /// the store (at-least-once).
    pub fn recover_pending(&mut self) {
        for bucket in pending_buckets(&self.cfg.samples_dir, self.log.bucket_start()) {
            info!("recovering unaggregated hour {bucket}");
            flush_bucket(
                &mut self.store,
                &self.cfg.server_name,
                &self.cfg.samples_dir,
                bucket,
            );
        }
    }

    /// One clock tick. Callers feed strictly increasing instants; the call
    /// runs to completion before the next tick begins.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        let bucket = bucket_of(now);
        if bucket > self.log.bucket_start() {
            let closed = std::mem::replace(
                &mut self.log,
                HourLog::open(&self.cfg.samples_dir, bucket),
            );
            flush_bucket(
                &mut self.store,
                &self.cfg.server_name,
                &self.cfg.samples_dir,
                closed.bucket_start(),
            );
        }

        // Total metrics failure skips the rest of the tick; buffers stay as
        // they were.
        let sample = match self.metrics.sample(now) {
            Ok(s) => s,
            Err(e) => {
                warn!("metrics collection failed, skipping tick: {e:#}");
                return;
            }
        };

        // The in-memory copy survives a failed write, so the live window
        // below stays current either way.
        if let Err(e) = self.log.append(&sample) {
            warn!("hour log append failed: {e:#}");
        }

        let mut session_count = None;
        let mut delta: Option<SessionDelta> = None;
        if let Some(roster) = &self.roster {
            match roster.fetch_active().await {
                Ok(snapshot) => {
                    delta = Some(self.ledger.reconcile(&snapshot, now));
                    session_count = Some(self.ledger.open_count() as i64);
                }
                Err(e) => {
                    // Unreachable is not the same as confirmed-empty: skip
                    // reconciliation, keep every session open this tick.
                    warn!("roster fetch failed, leaving sessions untouched: {e}");
                    session_count = Some(self.ledger.open_count() as i64);
                }
            }
        }

        self.window.push(window_point(&sample, session_count));
        self.window.prune(now);

        match serde_json::to_string(&self.window.snapshot()) {
            Ok(window_json) => {
                if let Err(e) = self.store.upsert_current(
                    &self.cfg.server_name,
                    now,
                    &sample,
                    &window_json,
                    session_count,
                ) {
                    warn!("current-state upsert failed: {e:#}");
                }
            }
            Err(e) => warn!("window serialization failed: {e}"),
        }

        if let Some(delta) = delta {
            if !delta.is_empty() {
                if let Err(e) = self
                    .store
                    .sync_sessions(&self.cfg.server_name, now, &delta)
                {
                    warn!("session sync failed: {e:#}");
                }
            }
        }
    }
}

/// Aggregate one closed bucket from its durable file and push the result to
/// the store. The file is deleted only after the history row is in; on
/// store failure it stays behind so a later run can roll it up again.
fn flush_bucket<S: StatsStore>(store: &mut S, server: &str, dir: &Path, bucket: DateTime<Utc>) {
    let path = hour_file_path(dir, bucket);
    if !path.exists() {
        return;
    }

    let samples = match read_samples(&path) {
        Ok(s) => s,
        Err(e) => {
            warn!("reading hour file {} failed: {e:#}", path.display());
            return;
        }
    };

    let Some(aggregate) = aggregate_hour(bucket, &samples) else {
        // Nothing to aggregate; an empty file is safe to drop.
        if let Err(e) = fs::remove_file(&path) {
            warn!("removing empty hour file {} failed: {e}", path.display());
        }
        return;
    };

    match store.append_history(server, &aggregate) {
        Ok(()) => {
            info!("hour {} rolled up ({} samples)", bucket, aggregate.samples.len());
            if let Err(e) = fs::remove_file(&path) {
                warn!("removing hour file {} failed: {e}", path.display());
            }
        }
        Err(e) => warn!(
            "history insert failed, keeping {} for later rollup: {e:#}",
            path.display()
        ),
    }
}
