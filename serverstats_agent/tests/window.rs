//! Rolling window behavior: derived-record rounding and time-based pruning.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serverstats_agent::types::{DriveStat, Sample};
use serverstats_agent::window::{window_point, RecentWindow};

fn at(minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, minute, second).unwrap()
}

fn sample_at(t: DateTime<Utc>) -> Sample {
    Sample {
        t,
        cpu: Some(42.0),
        mem_used_mb: None,
        mem_total_mb: None,
        drives: Vec::new(),
    }
}

#[test]
fn ram_percent_from_used_and_total() {
    let s = Sample {
        t: at(0, 0),
        cpu: Some(33.333),
        mem_used_mb: Some(100),
        mem_total_mb: Some(200),
        drives: Vec::new(),
    };
    let p = window_point(&s, Some(3));
    assert_eq!(p.cpu, Some(33.3));
    assert_eq!(p.ram, Some(50.0));
    assert_eq!(p.sessions, Some(3));
}

#[test]
fn ram_omitted_without_total() {
    let s = Sample {
        t: at(0, 0),
        cpu: None,
        mem_used_mb: Some(100),
        mem_total_mb: None,
        drives: Vec::new(),
    };
    assert_eq!(window_point(&s, None).ram, None);

    let s = Sample {
        t: at(0, 0),
        cpu: None,
        mem_used_mb: Some(100),
        mem_total_mb: Some(0),
        drives: Vec::new(),
    };
    assert_eq!(window_point(&s, None).ram, None);
}

#[test]
fn drive_percent_used_clamped_and_rounded() {
    let s = Sample {
        t: at(0, 0),
        cpu: None,
        mem_used_mb: None,
        mem_total_mb: None,
        drives: vec![
            DriveStat {
                drive: "C:".into(),
                total_gb: 100.0,
                free_gb: 25.0,
            },
            // reported free above total clamps to 0% used
            DriveStat {
                drive: "D:".into(),
                total_gb: 100.0,
                free_gb: 150.0,
            },
            // non-positive total is skipped entirely
            DriveStat {
                drive: "E:".into(),
                total_gb: 0.0,
                free_gb: 0.0,
            },
        ],
    };
    let p = window_point(&s, None);
    assert_eq!(p.drives.len(), 2);
    assert_eq!(p.drives[0].drive, "C:");
    assert_eq!(p.drives[0].pct, 75.0);
    assert_eq!(p.drives[1].pct, 0.0);
}

#[test]
fn prune_drops_entries_older_than_window() {
    let mut window = RecentWindow::new(Duration::minutes(30));
    // one point per minute for 45 minutes
    for m in 0..45 {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap() + Duration::minutes(m);
        window.push(window_point(&sample_at(t), None));
    }
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 44, 0).unwrap();
    window.prune(now);

    let cutoff = now - Duration::minutes(30);
    let snapshot = window.snapshot();
    assert!(snapshot.iter().all(|p| p.t >= cutoff));
    // minutes 14..=44 inclusive: entry exactly at the cutoff is kept
    assert_eq!(snapshot.len(), 31);
}

#[test]
fn prune_on_empty_window_is_a_noop() {
    let mut window = RecentWindow::new(Duration::minutes(30));
    window.prune(at(0, 0));
    assert!(window.is_empty());
}

#[test]
fn snapshot_is_chronological() {
    let mut window = RecentWindow::new(Duration::minutes(30));
    window.push(window_point(&sample_at(at(1, 0)), None));
    window.push(window_point(&sample_at(at(2, 0)), None));
    let snapshot = window.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot[0].t < snapshot[1].t);
    // snapshot is a copy; the window itself is untouched
    assert_eq!(window.len(), 2);
}
