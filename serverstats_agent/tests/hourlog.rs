//! Durable hour log: file naming, bucket math, append/replay and
//! stale-bucket discovery.

use std::fs;
use std::io::Write;

use chrono::{DateTime, TimeZone, Utc};
use serverstats_agent::hourlog::{
    bucket_of, hour_file_path, pending_buckets, read_samples, HourLog,
};
use serverstats_agent::types::{DriveStat, Sample};

fn bucket() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

fn sample(minute: u32, cpu: f64) -> Sample {
    Sample {
        t: Utc.with_ymd_and_hms(2024, 5, 1, 13, minute, 0).unwrap(),
        cpu: Some(cpu),
        mem_used_mb: Some(1024),
        mem_total_mb: Some(2048),
        drives: vec![DriveStat {
            drive: "C:".into(),
            total_gb: 100.0,
            free_gb: 40.0,
        }],
    }
}

#[test]
fn bucket_of_truncates_to_hour_start() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 42, 17).unwrap();
    assert_eq!(bucket_of(now), bucket());
    assert_eq!(bucket_of(bucket()), bucket());
}

#[test]
fn file_identity_is_date_and_hour() {
    let dir = tempfile::tempdir().unwrap();
    let path = hour_file_path(dir.path(), bucket());
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "samples_2024-05-01_13.jsonl"
    );
}

#[test]
fn append_then_read_back_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = HourLog::open(dir.path(), bucket());

    let samples = vec![sample(0, 10.0), sample(1, 20.0), sample(2, 30.0)];
    for s in &samples {
        log.append(s).unwrap();
    }
    assert_eq!(log.len(), 3);

    let replayed = read_samples(log.path()).unwrap();
    assert_eq!(replayed, samples);
}

#[test]
fn malformed_lines_are_skipped_on_replay() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = HourLog::open(dir.path(), bucket());
    log.append(&sample(0, 10.0)).unwrap();

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(log.path())
        .unwrap();
    writeln!(file, "{{not json").unwrap();
    drop(file);

    log.append(&sample(1, 20.0)).unwrap();

    let replayed = read_samples(log.path()).unwrap();
    assert_eq!(replayed.len(), 2);
    assert_eq!(replayed[0].cpu, Some(10.0));
    assert_eq!(replayed[1].cpu, Some(20.0));
}

#[test]
fn blank_lines_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = HourLog::open(dir.path(), bucket());
    log.append(&sample(0, 10.0)).unwrap();

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(log.path())
        .unwrap();
    writeln!(file).unwrap();
    drop(file);

    assert_eq!(read_samples(log.path()).unwrap().len(), 1);
}

#[test]
fn pending_buckets_lists_older_hours_only() {
    let dir = tempfile::tempdir().unwrap();
    let old1 = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
    let old2 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    HourLog::open(dir.path(), old2).append(&sample(0, 1.0)).unwrap();
    HourLog::open(dir.path(), old1).append(&sample(0, 1.0)).unwrap();
    HourLog::open(dir.path(), bucket()).append(&sample(0, 1.0)).unwrap();
    // unrelated files are ignored
    fs::write(dir.path().join("notes.txt"), "hi").unwrap();

    let pending = pending_buckets(dir.path(), bucket());
    assert_eq!(pending, vec![old1, old2]);
}

#[test]
fn pending_buckets_on_missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(pending_buckets(&missing, bucket()).is_empty());
}
