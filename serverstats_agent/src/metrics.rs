//! Metrics collection using sysinfo. Persistent handles are kept across
//! ticks so CPU usage is computed from the delta since the previous refresh.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use sysinfo::{Disks, System};

use crate::types::{round2, DriveStat, Sample};

const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Source of raw machine readings. Best-effort: a single missing metric
/// yields an absent field; only total unavailability is an error.
pub trait MetricsSource {
    fn sample(&mut self, now: DateTime<Utc>) -> Result<Sample>;
}

/// sysinfo-backed source for the host the agent runs on.
pub struct SysinfoMetrics {
    sys: System,
    disks: Disks,
}

impl SysinfoMetrics {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Baseline refresh so the first tick's CPU delta has a reference.
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    fn cpu_percent(&mut self) -> Option<f64> {
        self.sys.refresh_cpu_usage();
        if self.sys.cpus().is_empty() {
            return None;
        }
        Some(round2(
            (self.sys.global_cpu_usage() as f64).clamp(0.0, 100.0),
        ))
    }

    fn memory_mb(&mut self) -> (Option<i64>, Option<i64>) {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return (None, None);
        }
        let used = total.saturating_sub(self.sys.available_memory());
        (
            Some((used / BYTES_PER_MB) as i64),
            Some((total / BYTES_PER_MB) as i64),
        )
    }

    fn drive_stats(&mut self) -> Vec<DriveStat> {
        self.disks.refresh_list();
        self.disks
            .iter()
            .filter(|d| d.total_space() > 0)
            .map(|d| DriveStat {
                drive: d.mount_point().to_string_lossy().trim().to_string(),
                total_gb: round2(d.total_space() as f64 / BYTES_PER_GB),
                free_gb: round2(d.available_space() as f64 / BYTES_PER_GB),
            })
            .collect()
    }
}

impl Default for SysinfoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoMetrics {
    fn sample(&mut self, now: DateTime<Utc>) -> Result<Sample> {
        let cpu = self.cpu_percent();
        let (mem_used_mb, mem_total_mb) = self.memory_mb();
        let drives = self.drive_stats();

        if cpu.is_none() && mem_total_mb.is_none() && drives.is_empty() {
            bail!("no metrics available from the OS");
        }

        Ok(Sample {
            t: now,
            cpu,
            mem_used_mb,
            mem_total_mb,
            drives,
        })
    }
}
