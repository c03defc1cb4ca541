//! Pure hourly reduction: a closed bucket's samples collapse into one
//! summary row. Absent readings are excluded from both numerator and
//! denominator, never counted as zero.

use chrono::{DateTime, Utc};

use crate::sessions::ident_key;
use crate::types::{round2, DriveAggregate, HourlyAggregate, Sample};

/// Reduce a bucket's samples into an aggregate. Returns `None` for an empty
/// input — there is nothing to summarize and no history row is produced.
pub fn aggregate_hour(bucket_start: DateTime<Utc>, samples: &[Sample]) -> Option<HourlyAggregate> {
    if samples.is_empty() {
        return None;
    }

    let mut cpu_sum = 0.0;
    let mut cpu_count = 0u32;
    let mut mem_sum: i64 = 0;
    let mut mem_count: i64 = 0;
    let mut mem_total: Option<i64> = None;

    for s in samples {
        if let Some(cpu) = s.cpu {
            cpu_sum += cpu;
            cpu_count += 1;
        }
        if let Some(used) = s.mem_used_mb {
            mem_sum += used;
            mem_count += 1;
        }
        if mem_total.is_none() {
            // assumed constant within an hour; first present value wins
            mem_total = s.mem_total_mb;
        }
    }

    let cpu_avg = (cpu_count > 0).then(|| round2(cpu_sum / cpu_count as f64));
    let mem_used_avg_mb = (mem_count > 0).then(|| mem_sum / mem_count);

    Some(HourlyAggregate {
        bucket_start,
        cpu_avg,
        mem_used_avg_mb,
        mem_total_mb: mem_total,
        drives: aggregate_drives(samples),
        samples: samples.to_vec(),
    })
}

/// Group every drive reading across the hour by case-insensitive drive name
/// and compute min/mean free space. The first-seen spelling of each name is
/// kept for display.
fn aggregate_drives(samples: &[Sample]) -> Vec<DriveAggregate> {
    let mut by_drive: std::collections::BTreeMap<String, (String, Vec<f64>)> =
        std::collections::BTreeMap::new();

    for s in samples {
        for d in &s.drives {
            let name = d.drive.trim();
            if name.is_empty() {
                continue;
            }
            by_drive
                .entry(ident_key(&[name]))
                .or_insert_with(|| (name.to_string(), Vec::new()))
                .1
                .push(d.free_gb);
        }
    }

    by_drive
        .into_values()
        .map(|(drive, free)| {
            let min = free.iter().copied().fold(f64::INFINITY, f64::min);
            let avg = free.iter().sum::<f64>() / free.len() as f64;
            DriveAggregate {
                drive,
                min_free_gb: round2(min),
                avg_free_gb: round2(avg),
            }
        })
        .collect()
}
