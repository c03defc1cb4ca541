//! Sample line format: present fields round-trip exactly, absent fields
//! stay absent on the wire and come back absent.

use chrono::{TimeZone, Utc};
use serverstats_agent::types::{DriveStat, RosterResponse, Sample};

#[test]
fn full_sample_round_trips() {
    let sample = Sample {
        t: Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap(),
        cpu: Some(42.5),
        mem_used_mb: Some(1024),
        mem_total_mb: Some(2048),
        drives: vec![DriveStat {
            drive: "C:".into(),
            total_gb: 100.0,
            free_gb: 40.25,
        }],
    };
    let line = serde_json::to_string(&sample).unwrap();
    let back: Sample = serde_json::from_str(&line).unwrap();
    assert_eq!(back, sample);
}

#[test]
fn absent_fields_are_omitted_not_null() {
    let sample = Sample {
        t: Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap(),
        cpu: None,
        mem_used_mb: None,
        mem_total_mb: None,
        drives: Vec::new(),
    };
    let line = serde_json::to_string(&sample).unwrap();
    assert!(!line.contains("cpu"));
    assert!(!line.contains("memUsed"));
    assert!(!line.contains("memTotal"));
    assert!(!line.contains("drives"));

    let back: Sample = serde_json::from_str(&line).unwrap();
    assert_eq!(back, sample);
}

#[test]
fn wire_field_names_match_the_line_format() {
    let sample = Sample {
        t: Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap(),
        cpu: Some(10.0),
        mem_used_mb: Some(1),
        mem_total_mb: Some(2),
        drives: vec![DriveStat {
            drive: "C:".into(),
            total_gb: 1.0,
            free_gb: 0.5,
        }],
    };
    let value: serde_json::Value = serde_json::to_value(&sample).unwrap();
    assert!(value.get("t").is_some());
    assert_eq!(value["cpu"], 10.0);
    assert_eq!(value["memUsed"], 1);
    assert_eq!(value["memTotal"], 2);
    assert_eq!(value["drives"][0]["Drive"], "C:");
    assert_eq!(value["drives"][0]["TotalGB"], 1.0);
    assert_eq!(value["drives"][0]["FreeGB"], 0.5);
}

#[test]
fn roster_response_parses_service_body() {
    let body = r#"{"activeSessions":[
        {"userName":"alice","employeeNumber":"e1"},
        {"userName":"bob"}
    ]}"#;
    let response: RosterResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.active_sessions.len(), 2);
    assert_eq!(response.active_sessions[0].user_name, "alice");
    assert_eq!(
        response.active_sessions[0].employee_number.as_deref(),
        Some("e1")
    );
    assert_eq!(response.active_sessions[1].employee_number, None);
}

#[test]
fn roster_response_without_sessions_field_is_empty() {
    let response: RosterResponse = serde_json::from_str("{}").unwrap();
    assert!(response.active_sessions.is_empty());
}
