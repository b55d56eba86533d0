use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The emergency report payload, serialized as-is into the POST body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub phone: String,
    pub message: String,
    pub lat: f64,
    pub lng: f64,
}

/// A raw coordinate pair from a position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The outcome of one location acquisition: where the device is, plus a
/// best-effort human-readable address (geocoded, or the formatted
/// coordinates when geocoding gave nothing usable).
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Envelope the report API wraps every response in.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub report: Option<ReportRecord>,
}

/// The stored record the server echoes back on a successful create.
/// Only the fields the client cares about; the server sends more.
/// `created_at` is a naive UTC timestamp (the server serializes it
/// without an offset).
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
