//! Process-wide query-execution notification channel.
//!
//! Instrumented data-access code publishes one [`SqlEvent`] per executed
//! statement; subscribers receive it synchronously on the publishing
//! task. The recorder installs exactly one subscriber at startup and
//! demultiplexes events to the in-flight request via its task-local
//! context, so no addressing is needed here.

use std::future::Future;
use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::RwLock;

/// What an instrumented call actually executed. Schema introspection and
/// query-cache hits are published too, but excluded from capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Statement,
    Schema,
    CacheHit,
}

/// One query execution as seen by the host's data layer.
#[derive(Debug, Clone)]
pub struct SqlEvent {
    pub sql: String,
    pub started: Instant,
    pub finished: Instant,
    pub kind: QueryKind,
}

type Subscriber = Box<dyn Fn(&SqlEvent) + Send + Sync>;

static SUBSCRIBERS: OnceLock<RwLock<Vec<Subscriber>>> = OnceLock::new();

fn subscribers() -> &'static RwLock<Vec<Subscriber>> {
    SUBSCRIBERS.get_or_init(|| RwLock::new(Vec::new()))
}

/// Register a subscriber for every future [`publish`] call.
/// Subscribers live for the rest of the process.
pub fn subscribe<F>(subscriber: F)
where
    F: Fn(&SqlEvent) + Send + Sync + 'static,
{
    subscribers().write().push(Box::new(subscriber));
}

/// Deliver one event to every subscriber, synchronously, in
/// registration order.
pub fn publish(event: &SqlEvent) {
    for subscriber in subscribers().read().iter() {
        subscriber(event);
    }
}

/// Time `work` and publish its execution as `sql`.
///
/// This is the seam the demo data layer goes through; a real adapter
/// would wrap its driver calls the same way.
pub async fn instrument<F, T>(sql: impl Into<String>, kind: QueryKind, work: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let output = work.await;
    publish(&SqlEvent {
        sql: sql.into(),
        started,
        finished: Instant::now(),
        kind,
    });
    output
}

// ─── Tests ───────────────────────────────────────────────────────
