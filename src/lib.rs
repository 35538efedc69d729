//! Development-time request profiler for axum apps.
//!
//! The capture middleware times every non-skipped request, collects the
//! SQL it executed through a request-scoped recorder context, and appends
//! the finished profile to a bounded per-endpoint JSON log on disk. The
//! repository reads those logs back — repairing known corruption patterns
//! on the way — and serves aggregate and per-page reports under
//! `/dev/performance_profiles`.
//!
//! Strictly a single-process, development-only tool: no sampling, no
//! cross-process aggregation, no attempt to survive hostile input beyond
//! the self-healing the read path already does.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod profiles;
pub mod recorder;
pub mod server;
pub mod slug;

pub use config::ProfilerConfig;
pub use error::{ProfilerError, Result};
pub use middleware::profiler::Profiler;
pub use profiles::{AggregatedPageStats, PageDetail, ProfileRecord, QueryEvent};
