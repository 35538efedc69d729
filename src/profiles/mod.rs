pub mod report;
pub mod repository;
pub mod stats;
pub mod store;

pub use repository::{PageDetail, ProfileRepository};
pub use store::ProfileStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Round to two decimals — every persisted duration uses this.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Millisecond-precision UTC timestamp. Fixed-width, so lexicographic
/// order on stored records is chronological order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ─── Persisted data model ────────────────────────────────────────

/// One downstream query observed during a request.
/// Lives inside a request's recorder context until the profile is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryEvent {
    pub sql: String,
    /// Wall time of the query round-trip (ms).
    #[serde(rename = "duration")]
    pub duration_ms: f64,
}

/// One completed request measurement, as stored in a page log.
///
/// Old or partially-written entries can miss fields; everything defaults
/// on read and nothing is re-validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub url: String,
    pub method: String,
    /// Total handler wall time (ms).
    #[serde(rename = "total_time")]
    pub total_time_ms: f64,
    /// Sum of query durations (ms).
    #[serde(rename = "sql_time")]
    pub sql_time_ms: f64,
    /// Queries in emission order.
    #[serde(rename = "sql_queries")]
    pub queries: Vec<QueryEvent>,
    /// Millisecond-precision ISO-8601, UTC.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ProfileRecord {
    /// Build a record stamped with the current wall clock.
    /// `sql_time_ms` is derived from the queries, never passed in.
    pub fn new(
        url: impl Into<String>,
        method: impl Into<String>,
        total_time_ms: f64,
        queries: Vec<QueryEvent>,
        request_id: Option<String>,
    ) -> Self {
        let sql_time_ms = round2(queries.iter().map(|q| q.duration_ms).sum());
        Self {
            url: url.into(),
            method: method.into(),
            total_time_ms: round2(total_time_ms),
            sql_time_ms,
            queries,
            timestamp: now_timestamp(),
            request_id,
        }
    }
}

/// Per-page aggregate computed on every read request — never cached.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedPageStats {
    pub page_slug: String,
    /// Path of the newest record in the log.
    pub url: String,
    pub profile_count: usize,
    pub mean_load_time: f64,
    pub median_load_time: f64,
    pub p95_load_time: f64,
    pub mean_sql_time: f64,
    pub mean_sql_queries: f64,
    pub latest_timestamp: String,
}

// ─── Tests ───────────────────────────────────────────────────────
