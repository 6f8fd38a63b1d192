//! Wire schemas shared by both HTTP surfaces (§6 of the specification).
//!
//! `additionalProperties: false` in the source schemas is enforced by
//! `serde(deny_unknown_fields)` — an unrecognised field fails the same way
//! a schema mismatch would, and the failure is surfaced as 400 per §4.6.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::logstore::LogEntry;

/// Parse a request body per the validation order in §4.6: Content-Type
/// first (reject non-JSON with a 400), then the JSON parse itself (400).
/// Schema validation (`deny_unknown_fields`, field types) falls out of the
/// `Deserialize` impl and is reported identically.
pub fn parse_json_body<T: serde::de::DeserializeOwned>(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<T, &'static str> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    if !content_type.starts_with("application/json") {
        return Err("expected a Content-Type of application/json");
    }
    serde_json::from_slice(body).map_err(|_| "invalid request body")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReceiveKeyCodeRequest {
    pub key_sequence: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct KeypadLockRequest {
    /// Absolute unlock wall-clock time, seconds since epoch.
    pub lock_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct RetrieveConsoleLogsRequest {
    pub start_timestamp: f64,
}

impl Default for RetrieveConsoleLogsRequest {
    fn default() -> Self {
        Self { start_timestamp: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogsResponse {
    pub last_timestamp: f64,
    pub entries: Vec<LogEntry>,
}

impl RequestLogsResponse {
    pub fn from_entries(entries: Vec<LogEntry>, fallback_last: f64) -> Self {
        let last_timestamp = entries.last().map(|e| e.timestamp).unwrap_or(fallback_last);
        Self { last_timestamp, entries }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub health: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { health: "normal" }
    }
}

/// Client-side counterpart of [`HealthResponse`]: the power console parses
/// `{"health": "..."}` back from either peer without caring that the
/// server side only ever emits the literal `"normal"`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub health: String,
}
