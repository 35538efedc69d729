//! JSON reporting endpoints over the stored page logs.
//!
//!   GET /dev/performance_profiles          — aggregate list, `?sort=` aware
//!   GET /dev/performance_profiles/:slug    — full history for one page
//!
//! Read failures never 500: the handlers answer with an empty data set
//! and the error message, so a corrupt artifact cannot take down the
//! report a developer is trying to read.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::repository::ProfileRepository;
use super::{AggregatedPageStats, ProfileRecord};

// ─── Sorting ─────────────────────────────────────────────────────

/// List ordering, from the `sort` query parameter.
/// Unknown values fall back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Url,
    Count,
    MeanAsc,
    SqlTime,
    /// Default: slowest pages first.
    MeanDesc,
}

impl SortKey {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("url") => Self::Url,
            Some("count") => Self::Count,
            Some("mean_asc") => Self::MeanAsc,
            Some("sql_time") => Self::SqlTime,
            _ => Self::MeanDesc,
        }
    }
}

/// Order `pages` in place according to `key`.
pub fn sort_pages(pages: &mut [AggregatedPageStats], key: SortKey) {
    match key {
        SortKey::Url => pages.sort_by(|a, b| a.url.cmp(&b.url)),
        SortKey::Count => pages.sort_by(|a, b| b.profile_count.cmp(&a.profile_count)),
        SortKey::MeanAsc => pages.sort_by(|a, b| a.mean_load_time.total_cmp(&b.mean_load_time)),
        SortKey::SqlTime => pages.sort_by(|a, b| b.mean_sql_time.total_cmp(&a.mean_sql_time)),
        SortKey::MeanDesc => pages.sort_by(|a, b| b.mean_load_time.total_cmp(&a.mean_load_time)),
    }
}

// ─── Handlers ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListParams {
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
struct PageListResponse {
    pages: Vec<AggregatedPageStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct PageDetailResponse {
    page_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    profile_count: usize,
    profiles: Vec<ProfileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Mount the reporting endpoints for `repository`.
pub fn router(repository: ProfileRepository) -> Router {
    let repository = Arc::new(repository);
    Router::new()
        .route("/dev/performance_profiles", get(list_pages))
        .route("/dev/performance_profiles/:slug", get(page_detail))
        .with_state(repository)
}

async fn list_pages(
    State(repository): State<Arc<ProfileRepository>>,
    Query(params): Query<ListParams>,
) -> Json<PageListResponse> {
    let mut response = match repository.load_all() {
        Ok(pages) if pages.is_empty() => PageListResponse {
            pages: Vec::new(),
            message: Some(
                "No performance profiles found. Visit some pages to generate profiles.".into(),
            ),
        },
        Ok(pages) => PageListResponse { pages, message: None },
        Err(err) => {
            warn!(error = %err, "failed to load performance profiles");
            PageListResponse {
                pages: Vec::new(),
                message: Some(format!("Failed to load performance profiles: {err}")),
            }
        }
    };

    sort_pages(&mut response.pages, SortKey::parse(params.sort.as_deref()));
    Json(response)
}

async fn page_detail(
    State(repository): State<Arc<ProfileRepository>>,
    Path(slug): Path<String>,
) -> Json<PageDetailResponse> {
    match repository.load_one(&slug) {
        Ok(detail) => Json(PageDetailResponse {
            page_slug: detail.page_slug,
            url: detail.url,
            profile_count: detail.records.len(),
            profiles: detail.records,
            message: detail.message,
        }),
        Err(err) => {
            warn!(%slug, error = %err, "failed to load page profiles");
            Json(PageDetailResponse {
                page_slug: slug,
                url: None,
                profile_count: 0,
                profiles: Vec::new(),
                message: Some(format!("Failed to load performance profiles: {err}")),
            })
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn page(slug: &str, url: &str, count: usize, mean: f64, sql: f64) -> AggregatedPageStats {
        AggregatedPageStats {
            page_slug: slug.into(),
            url: url.into(),
            profile_count: count,
            mean_load_time: mean,
            median_load_time: mean,
            p95_load_time: mean,
            mean_sql_time: sql,
            mean_sql_queries: 1.0,
            latest_timestamp: "2026-08-07T10:00:00.000Z".into(),
        }
    }

    fn slugs(pages: &[AggregatedPageStats]) -> Vec<&str> {
        pages.iter().map(|p| p.page_slug.as_str()).collect()
    }

    #[test]
    fn default_sort_is_slowest_first() {
        let mut pages = vec![
            page("a", "/a", 1, 10.0, 1.0),
            page("b", "/b", 2, 30.0, 2.0),
            page("c", "/c", 3, 20.0, 3.0),
        ];
        sort_pages(&mut pages, SortKey::parse(None));
        assert_eq!(slugs(&pages), ["b", "c", "a"]);
    }

    #[test]
    fn sort_keys_cover_every_column() {
        let mut pages = vec![
            page("a", "/z", 1, 10.0, 9.0),
            page("b", "/a", 3, 30.0, 1.0),
            page("c", "/m", 2, 20.0, 5.0),
        ];

        sort_pages(&mut pages, SortKey::parse(Some("url")));
        assert_eq!(slugs(&pages), ["b", "c", "a"]);

        sort_pages(&mut pages, SortKey::parse(Some("count")));
        assert_eq!(slugs(&pages), ["b", "c", "a"]);

        sort_pages(&mut pages, SortKey::parse(Some("mean_asc")));
        assert_eq!(slugs(&pages), ["a", "c", "b"]);

        sort_pages(&mut pages, SortKey::parse(Some("sql_time")));
        assert_eq!(slugs(&pages), ["a", "c", "b"]);
    }

    #[test]
    fn unknown_sort_falls_back_to_default() {
        assert_eq!(SortKey::parse(Some("bogus")), SortKey::MeanDesc);
        assert_eq!(SortKey::parse(None), SortKey::MeanDesc);
    }
}
