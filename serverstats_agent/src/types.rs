//! Record types shared between the engine, the durable hour log and the store.
//! Keep this module minimal and stable — it defines the on-disk line format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fixed-drive reading inside a [`Sample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveStat {
    #[serde(rename = "Drive")]
    pub drive: String,
    #[serde(rename = "TotalGB")]
    pub total_gb: f64,
    #[serde(rename = "FreeGB")]
    pub free_gb: f64,
}

/// One raw reading per tick. Every metric is best-effort: a field the OS
/// query could not answer is absent, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "t")]
    pub t: DateTime<Utc>,
    #[serde(rename = "cpu", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(rename = "memUsed", skip_serializing_if = "Option::is_none")]
    pub mem_used_mb: Option<i64>,
    #[serde(rename = "memTotal", skip_serializing_if = "Option::is_none")]
    pub mem_total_mb: Option<i64>,
    #[serde(rename = "drives", default, skip_serializing_if = "Vec::is_empty")]
    pub drives: Vec<DriveStat>,
}

/// Percent-used of a single drive inside a [`WindowPoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivePct {
    #[serde(rename = "d")]
    pub drive: String,
    #[serde(rename = "pct")]
    pub pct: f64,
}

/// Lightweight derived record kept in the rolling window for live display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowPoint {
    #[serde(rename = "t")]
    pub t: DateTime<Utc>,
    #[serde(rename = "cpu", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(rename = "ram", skip_serializing_if = "Option::is_none")]
    pub ram: Option<f64>,
    #[serde(rename = "sessions", skip_serializing_if = "Option::is_none")]
    pub sessions: Option<i64>,
    #[serde(rename = "drives", default, skip_serializing_if = "Vec::is_empty")]
    pub drives: Vec<DrivePct>,
}

/// Min/mean free space for one drive over a closed hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveAggregate {
    #[serde(rename = "Drive")]
    pub drive: String,
    #[serde(rename = "MinFreeGB")]
    pub min_free_gb: f64,
    #[serde(rename = "AvgFreeGB")]
    pub avg_free_gb: f64,
}

/// Summary of one closed hour bucket, plus the raw samples it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAggregate {
    pub bucket_start: DateTime<Utc>,
    pub cpu_avg: Option<f64>,
    pub mem_used_avg_mb: Option<i64>,
    pub mem_total_mb: Option<i64>,
    pub drives: Vec<DriveAggregate>,
    pub samples: Vec<Sample>,
}

/// One identity in a roster snapshot, as reported by the external service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub user_name: String,
    #[serde(default)]
    pub employee_number: Option<String>,
}

/// Wire shape of the roster endpoint's response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    #[serde(default)]
    pub active_sessions: Vec<RosterMember>,
}

/// Round to 1 decimal place (window display values).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to 2 decimal places (aggregate values, GB readings).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
