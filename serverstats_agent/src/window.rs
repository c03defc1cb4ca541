//! Rolling window of derived display records: push one point per tick,
//! prune everything older than the window duration.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::types::{round1, DrivePct, Sample, WindowPoint};

/// Build the lightweight display record for one sample. CPU and RAM percent
/// are rounded to 1 decimal; RAM percent is omitted when the total is absent
/// or zero; drive percent-used is clamped to [0, 100] and drives with a
/// non-positive total are skipped.
pub fn window_point(sample: &Sample, sessions: Option<i64>) -> WindowPoint {
    let ram = match (sample.mem_used_mb, sample.mem_total_mb) {
        (Some(used), Some(total)) if total > 0 => {
            Some(round1(used as f64 * 100.0 / total as f64))
        }
        _ => None,
    };

    let drives = sample
        .drives
        .iter()
        .filter(|d| d.total_gb > 0.0)
        .map(|d| DrivePct {
            drive: d.drive.clone(),
            pct: round1(((d.total_gb - d.free_gb) * 100.0 / d.total_gb).clamp(0.0, 100.0)),
        })
        .collect();

    WindowPoint {
        t: sample.t,
        cpu: sample.cpu.map(round1),
        ram,
        sessions,
        drives,
    }
}

/// Time-ordered buffer covering the trailing window duration.
#[derive(Debug)]
pub struct RecentWindow {
    points: VecDeque<WindowPoint>,
    duration: Duration,
}

impl RecentWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            points: VecDeque::new(),
            duration,
        }
    }

    /// Append at the tail; callers feed non-decreasing timestamps.
    pub fn push(&mut self, point: WindowPoint) {
        self.points.push_back(point);
    }

    /// Drop every entry strictly older than `now - duration`. Runs every
    /// tick after push, so the exported window always reflects the last
    /// `duration` of history as of now.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.duration;
        while let Some(front) = self.points.front() {
            if front.t < cutoff {
                self.points.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consistent copy for serialization or cross-thread display reads.
    pub fn snapshot(&self) -> Vec<WindowPoint> {
        self.points.iter().cloned().collect()
    }
}
