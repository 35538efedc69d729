use std::sync::Arc;

use axum::{
    extract::Request,
    middleware as axum_mw,
    middleware::Next,
    response::Response,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::profiler::{capture, Profiler};
use crate::profiles::report;

/// Builds the demo Axum `Router`: workload routes, the profiler's
/// reporting endpoints, and the capture middleware around everything.
pub fn create_router(profiler: Arc<Profiler>) -> Router {
    let router = Router::new()
        // ── Demo workload ───────────────────────────────────────
        .route("/", get(handlers::index))
        .route("/contacts", get(handlers::list_contacts))
        .route("/contacts/:id", get(handlers::get_contact))
        .route("/orders", get(handlers::list_orders));

    // ── Profiler report, development only (skipped by capture) ──
    let router = match profiler.repository() {
        Ok(repository) => router.merge(report::router(repository)),
        Err(_) => router,
    };

    router
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(profiler, capture))
        .layer(axum_mw::from_fn(assign_request_id))
        .layer(TraceLayer::new_for_http())
}

/// Give every inbound request a correlation id unless the client sent
/// one; the capture middleware copies it into the stored profile.
async fn assign_request_id(mut req: Request, next: Next) -> Response {
    if !req.headers().contains_key("x-request-id") {
        if let Ok(value) = uuid::Uuid::new_v4().to_string().parse() {
            req.headers_mut().insert("x-request-id", value);
        }
    }
    next.run(req).await
}
