//! Local SQL store: last-write-wins current row per server, append-only
//! hourly history, and open/close session intervals.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::sessions::SessionDelta;
use crate::types::{HourlyAggregate, Sample};

/// Durable mirror of the engine's outputs.
pub trait StatsStore {
    /// Last-write-wins upsert keyed by server name.
    fn upsert_current(
        &mut self,
        server: &str,
        now: DateTime<Utc>,
        sample: &Sample,
        window_json: &str,
        session_count: Option<i64>,
    ) -> Result<()>;

    /// Append one history row per closed bucket. Not idempotent: duplicate
    /// calls create duplicate rows, acceptable under at-least-once rollup.
    fn append_history(&mut self, server: &str, aggregate: &HourlyAggregate) -> Result<()>;

    /// Commit all opens and closes of one tick atomically.
    fn sync_sessions(
        &mut self,
        server: &str,
        snapshot_time: DateTime<Utc>,
        delta: &SessionDelta,
    ) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open stats database {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Raw connection, for ad-hoc inspection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS server_stats_current (
                server_name TEXT PRIMARY KEY,
                last_updated TEXT NOT NULL,
                cpu_percent REAL,
                memory_used_mb INTEGER,
                memory_total_mb INTEGER,
                drive_stats_json TEXT,
                recent_samples_json TEXT,
                sessions_count INTEGER
            );

            CREATE TABLE IF NOT EXISTS server_stats_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_name TEXT NOT NULL,
                hour_start TEXT NOT NULL,
                cpu_avg REAL,
                memory_used_avg_mb INTEGER,
                memory_total_mb INTEGER,
                drive_stats_agg_json TEXT,
                raw_samples_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS roster_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_name TEXT NOT NULL,
                snapshot_time TEXT NOT NULL,
                user_name TEXT NOT NULL,
                employee_number TEXT,
                session_start TEXT NOT NULL,
                session_end TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_history_server_hour
                ON server_stats_history(server_name, hour_start);
            CREATE INDEX IF NOT EXISTS idx_sessions_open
                ON roster_sessions(server_name, session_end);",
        )?;
        Ok(())
    }
}

impl StatsStore for SqliteStore {
    fn upsert_current(
        &mut self,
        server: &str,
        now: DateTime<Utc>,
        sample: &Sample,
        window_json: &str,
        session_count: Option<i64>,
    ) -> Result<()> {
        let drive_stats_json = if sample.drives.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&sample.drives)?)
        };

        self.conn.execute(
            "INSERT INTO server_stats_current
                (server_name, last_updated, cpu_percent, memory_used_mb,
                 memory_total_mb, drive_stats_json, recent_samples_json, sessions_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(server_name) DO UPDATE SET
                last_updated = excluded.last_updated,
                cpu_percent = excluded.cpu_percent,
                memory_used_mb = excluded.memory_used_mb,
                memory_total_mb = excluded.memory_total_mb,
                drive_stats_json = excluded.drive_stats_json,
                recent_samples_json = excluded.recent_samples_json,
                sessions_count = excluded.sessions_count",
            params![
                server,
                now.to_rfc3339(),
                sample.cpu,
                sample.mem_used_mb,
                sample.mem_total_mb,
                drive_stats_json,
                window_json,
                session_count
            ],
        )?;
        Ok(())
    }

    fn append_history(&mut self, server: &str, aggregate: &HourlyAggregate) -> Result<()> {
        let drive_agg_json = if aggregate.drives.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&aggregate.drives)?)
        };
        let raw_samples_json = serde_json::to_string(&aggregate.samples)?;

        self.conn.execute(
            "INSERT INTO server_stats_history
                (server_name, hour_start, cpu_avg, memory_used_avg_mb,
                 memory_total_mb, drive_stats_agg_json, raw_samples_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                server,
                aggregate.bucket_start.to_rfc3339(),
                aggregate.cpu_avg,
                aggregate.mem_used_avg_mb,
                aggregate.mem_total_mb,
                drive_agg_json,
                raw_samples_json
            ],
        )?;
        Ok(())
    }

    fn sync_sessions(
        &mut self,
        server: &str,
        snapshot_time: DateTime<Utc>,
        delta: &SessionDelta,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        for open in &delta.opens {
            tx.execute(
                "INSERT INTO roster_sessions
                    (server_name, snapshot_time, user_name, employee_number,
                     session_start, session_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
                params![
                    server,
                    snapshot_time.to_rfc3339(),
                    open.user_name,
                    open.employee_number,
                    open.opened_at.to_rfc3339()
                ],
            )?;
        }

        for close in &delta.closes {
            tx.execute(
                "UPDATE roster_sessions
                 SET session_end = ?1
                 WHERE server_name = ?2
                   AND session_end IS NULL
                   AND user_name = ?3
                   AND COALESCE(employee_number, '') = ?4",
                params![
                    close.closed_at.to_rfc3339(),
                    server,
                    close.user_name,
                    close.employee_number.as_deref().unwrap_or("")
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
