//! End-to-end pipeline: demo router → capture middleware → page logs on
//! disk → reporting endpoints.

use std::fs;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::Router;
use tempfile::TempDir;
use tower::util::ServiceExt;

use dev_profiler::server::create_router;
use dev_profiler::{Profiler, ProfilerConfig};

fn demo_app(tmp: &TempDir) -> Router {
    let mut config = ProfilerConfig::development();
    config.storage_path = tmp.path().to_path_buf();
    create_router(Profiler::new(config))
}

async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success(), "GET {uri} failed: {}", response.status());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn profiles_accumulate_and_report() {
    let tmp = TempDir::new().unwrap();
    let app = demo_app(&tmp);

    for _ in 0..3 {
        get_json(&app, "/contacts").await;
    }
    get_json(&app, "/orders").await;

    // ── aggregate list ──────────────────────────────────────────
    let report = get_json(&app, "/dev/performance_profiles").await;
    let pages = report["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2, "expected contacts and orders: {report}");

    let contacts = pages.iter().find(|p| p["page_slug"] == "contacts").unwrap();
    assert_eq!(contacts["profile_count"], 3);
    assert_eq!(contacts["url"], "/contacts");
    assert!(contacts["mean_load_time"].as_f64().unwrap() > 0.0);
    assert!(contacts["p95_load_time"].as_f64().unwrap() >= contacts["median_load_time"].as_f64().unwrap());
    // two real statements per /contacts request, schema noise excluded
    assert_eq!(contacts["mean_sql_queries"], 2.0);

    // ── per-page detail ─────────────────────────────────────────
    let detail = get_json(&app, "/dev/performance_profiles/contacts").await;
    assert_eq!(detail["profile_count"], 3);
    let newest = &detail["profiles"][0];
    assert_eq!(newest["url"], "/contacts");
    assert_eq!(newest["sql_queries"].as_array().unwrap().len(), 2);
    assert!(newest["request_id"].is_string(), "server should assign x-request-id");

    // ── unknown slug ────────────────────────────────────────────
    let missing = get_json(&app, "/dev/performance_profiles/nothing_here").await;
    assert_eq!(missing["profile_count"], 0);
    assert_eq!(missing["message"], "No profiles found for this page");
}

#[tokio::test]
async fn report_survives_and_repairs_a_corrupted_log() {
    let tmp = TempDir::new().unwrap();
    let app = demo_app(&tmp);

    get_json(&app, "/contacts").await;

    // simulate the historical duplicated-bracket corruption
    let artifact = tmp.path().join("contacts.json");
    let mut content = fs::read_to_string(&artifact).unwrap();
    content.push(']');
    fs::write(&artifact, content).unwrap();

    let report = get_json(&app, "/dev/performance_profiles").await;
    assert_eq!(report["pages"].as_array().unwrap().len(), 1);
    assert!(report.get("message").is_none(), "repair should be silent: {report}");

    // the artifact was rewritten in place; a second read needs no repair
    let reparsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(reparsed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn skipped_and_disabled_requests_leave_no_artifacts() {
    let tmp = TempDir::new().unwrap();
    let mut config = ProfilerConfig::disabled();
    config.storage_path = tmp.path().to_path_buf();
    let app = create_router(Profiler::new(config));

    get_json(&app, "/contacts").await;
    get_json(&app, "/orders").await;

    // disabled profiler never creates the storage directory
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());

    // and the reporting surface is not mounted at all
    let request = Request::builder()
        .uri("/dev/performance_profiles")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 404);
}
