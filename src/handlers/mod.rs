//! Demo workload: a pretend contacts/orders app whose "database" is a
//! random sleep published through the query notification channel. Enough
//! to light the profiler up end to end — run the demo, click around,
//! then open /dev/performance_profiles.

use std::time::Duration;

use axum::{extract::Path, Json};
use serde::Serialize;

use crate::notifications::{self, QueryKind};

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: u32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub contact_id: u32,
    pub total_cents: u64,
    pub placed_at: String,
}

// ─── Simulated data layer ────────────────────────────────────────

/// "Execute" `sql`: sleep a few milliseconds and publish the execution.
async fn run_query(sql: &str, kind: QueryKind) {
    let millis = {
        use rand::Rng;
        rand::thread_rng().gen_range(0.3..6.0)
    };
    notifications::instrument(
        sql,
        kind,
        tokio::time::sleep(Duration::from_secs_f64(millis / 1000.0)),
    )
    .await;
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index() -> Json<serde_json::Value> {
    run_query("SELECT COUNT(*) FROM \"contacts\"", QueryKind::Statement).await;
    Json(serde_json::json!({
        "app": "dev-profiler demo",
        "try": ["/contacts", "/contacts/7", "/orders", "/dev/performance_profiles"],
    }))
}

// ─── GET /contacts ───────────────────────────────────────────────

pub async fn list_contacts() -> Json<Vec<Contact>> {
    run_query(
        "SELECT \"contacts\".* FROM \"contacts\" ORDER BY \"name\" LIMIT 50",
        QueryKind::Statement,
    )
    .await;
    run_query("SELECT COUNT(*) FROM \"contacts\"", QueryKind::Statement).await;

    Json((1..=3).map(contact).collect())
}

// ─── GET /contacts/:id ───────────────────────────────────────────

pub async fn get_contact(Path(id): Path<u32>) -> Json<Contact> {
    // schema introspection happens on a cold connection; the profiler
    // must not count it
    run_query("PRAGMA table_info(\"contacts\")", QueryKind::Schema).await;
    run_query(
        "SELECT \"contacts\".* FROM \"contacts\" WHERE \"id\" = $1 LIMIT 1",
        QueryKind::Statement,
    )
    .await;

    Json(contact(id))
}

// ─── GET /orders ─────────────────────────────────────────────────

pub async fn list_orders() -> Json<Vec<Order>> {
    run_query(
        "SELECT \"orders\".* FROM \"orders\" ORDER BY \"placed_at\" DESC LIMIT 50",
        QueryKind::Statement,
    )
    .await;
    run_query(
        "SELECT \"contacts\".* FROM \"contacts\" WHERE \"id\" IN ($1, $2, $3)",
        QueryKind::Statement,
    )
    .await;
    // repeated lookups hit the query cache
    run_query(
        "SELECT \"contacts\".* FROM \"contacts\" WHERE \"id\" = $1",
        QueryKind::CacheHit,
    )
    .await;

    let orders = (1..=3)
        .map(|n| Order {
            id: format!("ord_{}", &uuid::Uuid::new_v4().to_string()[..8]),
            contact_id: n,
            total_cents: 1250 * n as u64,
            placed_at: chrono::Utc::now().to_rfc3339(),
        })
        .collect();
    Json(orders)
}

// ─── Helpers ─────────────────────────────────────────────────────

fn contact(id: u32) -> Contact {
    Contact {
        id,
        name: format!("Contact {id}"),
        email: format!("contact{id}@example.com"),
    }
}
