//! Capture middleware: times each request, collects its query events,
//! and appends the finished profile to the page log.
//!
//! Disabled or skipped requests pass straight through with zero side
//! effects. Storage failures are logged and swallowed — profiling must
//! never change the response the handler already produced. If the
//! handler panics, the context guard tears the recorder slot down on
//! unwind and nothing is persisted.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::config::ProfilerConfig;
use crate::error::{ProfilerError, Result};
use crate::profiles::{ProfileRecord, ProfileRepository, ProfileStore};
use crate::recorder;
use crate::slug::slug_for;

/// Shared profiler state: configuration plus the store the middleware
/// appends to. Constructing one installs the process-wide query
/// subscription (idempotently).
pub struct Profiler {
    config: ProfilerConfig,
    store: ProfileStore,
}

impl Profiler {
    pub fn new(config: ProfilerConfig) -> Arc<Self> {
        recorder::install();
        let store = ProfileStore::new(&config.storage_path);
        Arc::new(Self { config, store })
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Read-side companion over the same storage directory. Refused while
    /// the profiler is disabled — the reporting surface is development-only,
    /// so hosts simply don't mount it then.
    pub fn repository(&self) -> Result<ProfileRepository> {
        if !self.config.enabled {
            return Err(ProfilerError::Disabled);
        }
        Ok(ProfileRepository::new(&self.config.storage_path))
    }
}

/// The middleware itself; attach with
/// `axum::middleware::from_fn_with_state(profiler, capture)`.
pub async fn capture(
    State(profiler): State<Arc<Profiler>>,
    req: Request,
    next: Next,
) -> Response {
    if !profiler.config.enabled {
        return next.run(req).await;
    }

    let path = req.uri().path().to_owned();
    if profiler.config.skips(&path) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let guard = recorder::begin();
    let started = Instant::now();
    let response = recorder::scope(guard.id(), next.run(req)).await;
    let total_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    let queries = guard.finish();
    let record = ProfileRecord::new(&path, method, total_time_ms, queries, request_id);
    let slug = slug_for(&path);

    match profiler.store.append(&slug, record, profiler.config.retention_count) {
        Ok(count) => debug!(%slug, profiles = count, "stored request profile"),
        // non-fatal: the response is already built, ship it anyway
        Err(err) => error!(%slug, error = %err, "failed to store request profile"),
    }

    response
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use super::*;
    use crate::notifications::{self, QueryKind};

    fn test_config(dir: &TempDir, enabled: bool) -> ProfilerConfig {
        let mut config = if enabled {
            ProfilerConfig::development()
        } else {
            ProfilerConfig::disabled()
        };
        config.storage_path = dir.path().to_path_buf();
        config
    }

    async fn contacts() -> &'static str {
        notifications::instrument(
            "SELECT \"contacts\".* FROM \"contacts\"",
            QueryKind::Statement,
            async {},
        )
        .await;
        notifications::instrument("PRAGMA table_info(contacts)", QueryKind::Schema, async {})
            .await;
        "ok"
    }

    fn app(profiler: Arc<Profiler>) -> Router {
        Router::new()
            .route("/contacts", get(contacts))
            .route("/assets/app.css", get(|| async { "body{}" }))
            .layer(axum::middleware::from_fn_with_state(profiler, capture))
    }

    async fn hit(app: &Router, uri: &str) {
        let request = HttpRequest::builder()
            .uri(uri)
            .header("x-request-id", "test-req-1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn captures_timing_and_queries() {
        let tmp = TempDir::new().unwrap();
        let profiler = Profiler::new(test_config(&tmp, true));
        let app = app(profiler.clone());

        hit(&app, "/contacts").await;

        let detail = profiler.repository().unwrap().load_one("contacts").unwrap();
        assert_eq!(detail.records.len(), 1);

        let record = &detail.records[0];
        assert_eq!(record.url, "/contacts");
        assert_eq!(record.method, "GET");
        assert!(record.total_time_ms >= 0.0);
        assert_eq!(record.request_id.as_deref(), Some("test-req-1"));
        // the schema query was filtered, the statement captured
        assert_eq!(record.queries.len(), 1);
        assert!(record.queries[0].sql.starts_with("SELECT"));
        assert_eq!(record.sql_time_ms, record.queries[0].duration_ms);
    }

    #[tokio::test]
    async fn disabled_profiler_stores_nothing() {
        let tmp = TempDir::new().unwrap();
        let profiler = Profiler::new(test_config(&tmp, false));
        let app = app(profiler.clone());

        hit(&app, "/contacts").await;

        assert!(matches!(profiler.repository(), Err(ProfilerError::Disabled)));
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn skipped_paths_store_nothing() {
        let tmp = TempDir::new().unwrap();
        let profiler = Profiler::new(test_config(&tmp, true));
        let app = app(profiler.clone());

        hit(&app, "/assets/app.css").await;

        assert!(profiler.repository().unwrap().load_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn consecutive_requests_do_not_leak_queries() {
        let tmp = TempDir::new().unwrap();
        let profiler = Profiler::new(test_config(&tmp, true));
        let app = app(profiler.clone());

        hit(&app, "/contacts").await;
        hit(&app, "/contacts").await;

        let detail = profiler.repository().unwrap().load_one("contacts").unwrap();
        assert_eq!(detail.records.len(), 2);
        for record in &detail.records {
            assert_eq!(record.queries.len(), 1, "events leaked between requests");
        }
    }
}
