//! Durable per-hour sample log: one JSONL file per hour bucket, one
//! self-contained line per sample. The file is the source of truth at
//! rollover so a restart mid-hour loses nothing already appended.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, DurationRound, NaiveDate, TimeZone, Timelike, Utc};
use tracing::warn;

use crate::types::Sample;

/// Truncate an instant to the start of its hour bucket.
pub fn bucket_of(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::hours(1)).unwrap_or(now)
}

/// File identity is (date, hour): `samples_2024-05-01_13.jsonl`.
pub fn hour_file_path(dir: &Path, bucket_start: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "samples_{}_{:02}.jsonl",
        bucket_start.format("%Y-%m-%d"),
        bucket_start.hour()
    ))
}

fn parse_hour_file_name(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_prefix("samples_")?.strip_suffix(".jsonl")?;
    let (date_part, hour_part) = stem.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let hour: u32 = hour_part.parse().ok()?;
    Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), hour, 0, 0)
        .single()
}

/// Buckets with a durable file on disk that predate `current`, oldest first.
/// These are hours a previous process run appended but never aggregated.
pub fn pending_buckets(dir: &Path, current: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut buckets = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return buckets,
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if let Some(bucket) = name.to_str().and_then(parse_hour_file_name) {
            if bucket < current {
                buckets.push(bucket);
            }
        }
    }
    buckets.sort();
    buckets
}

/// Read every sample line of a durable hour file. Malformed lines are
/// skipped with a warning; the rest of the file is still processed.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut samples = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Sample>(&line) {
            Ok(s) => samples.push(s),
            Err(e) => warn!(
                "skipping malformed line {} in {}: {e}",
                idx + 1,
                path.display()
            ),
        }
    }
    Ok(samples)
}

/// Append-only record of the current hour's samples, held in memory and
/// mirrored line-by-line to disk.
#[derive(Debug)]
pub struct HourLog {
    bucket_start: DateTime<Utc>,
    path: PathBuf,
    samples: Vec<Sample>,
}

impl HourLog {
    pub fn open(dir: &Path, bucket_start: DateTime<Utc>) -> Self {
        Self {
            bucket_start,
            path: hour_file_path(dir, bucket_start),
            samples: Vec::new(),
        }
    }

    pub fn bucket_start(&self) -> DateTime<Utc> {
        self.bucket_start
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample: kept in memory unconditionally, then written as one
    /// flushed line so a crash mid-write never leaves a partial line as the
    /// visible tail. A write error is returned for the caller to report but
    /// the in-memory copy survives for the rest of the bucket.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        self.samples.push(sample.clone());

        let mut line = serde_json::to_string(sample).context("serialize sample")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("flush {}", self.path.display()))?;
        Ok(())
    }
}
