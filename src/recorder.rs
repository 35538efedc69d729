//! Request-scoped query capture.
//!
//! One process-wide subscription to the query notification channel,
//! demultiplexed to the in-flight request through an explicit registry:
//! [`begin`] allocates an opaque context id and an empty slot, the
//! middleware runs the downstream handler inside [`scope`] so the id is
//! visible task-locally, and the subscriber appends to whatever slot the
//! current task points at. Concurrent requests therefore never see each
//! other's events, and code running outside any request records nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Once, OnceLock};

use parking_lot::Mutex;

use crate::notifications::{self, QueryKind};
use crate::profiles::QueryEvent;

tokio::task_local! {
    static CONTEXT_ID: u64;
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static REGISTRY: OnceLock<Mutex<HashMap<u64, Vec<QueryEvent>>>> = OnceLock::new();
static INSTALL: Once = Once::new();

fn registry() -> &'static Mutex<HashMap<u64, Vec<QueryEvent>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Subscribe to the query notification channel. Idempotent: however many
/// middleware instances are constructed, the process gets one subscriber.
///
/// Schema introspection and query-cache hits are filtered out here and
/// never reach a context.
pub fn install() {
    INSTALL.call_once(|| {
        notifications::subscribe(|event| {
            if event.kind != QueryKind::Statement {
                return;
            }
            let duration_ms =
                event.finished.saturating_duration_since(event.started).as_secs_f64() * 1000.0;
            record(&event.sql, duration_ms);
        });
    });
}

/// An active recorder context. Dropping it without calling
/// [`ContextGuard::finish`] discards the collected events — that is the
/// teardown path when the downstream handler panics.
#[derive(Debug)]
pub struct ContextGuard {
    id: u64,
    finished: bool,
}

/// Open a fresh, empty context. Pair with [`scope`] to make it the
/// ambient context of a request's task.
pub fn begin() -> ContextGuard {
    let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
    registry().lock().insert(id, Vec::new());
    ContextGuard { id, finished: false }
}

impl ContextGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detach and return the events collected so far. The context is gone
    /// afterwards; a later request reusing the same worker starts clean.
    pub fn finish(mut self) -> Vec<QueryEvent> {
        self.finished = true;
        registry().lock().remove(&self.id).unwrap_or_default()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if !self.finished {
            registry().lock().remove(&self.id);
        }
    }
}

/// Run `fut` with `context_id` as the ambient recorder context.
pub async fn scope<F>(context_id: u64, fut: F) -> F::Output
where
    F: std::future::Future,
{
    CONTEXT_ID.scope(context_id, fut).await
}

/// Append one query event to the ambient context.
///
/// A no-op when no context is active (background work, profiling
/// disabled) or when the context has already been detached. Negative
/// durations clamp to zero.
pub fn record(sql: &str, duration_ms: f64) {
    let Ok(id) = CONTEXT_ID.try_with(|id| *id) else {
        return;
    };
    let mut registry = registry().lock();
    if let Some(events) = registry.get_mut(&id) {
        events.push(QueryEvent {
            sql: sql.to_string(),
            duration_ms: crate::profiles::round2(duration_ms.max(0.0)),
        });
    }
}

// ─── Tests ───────────────────────────────────────────────────────
