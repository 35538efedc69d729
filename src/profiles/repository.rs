//! Read side of the page logs: enumeration, aggregation, and the
//! tolerant loader.
//!
//! Artifacts written by earlier buggy revisions of the profiler show two
//! structural corruption patterns — a doubled closing bracket at the end
//! of the array, and an array that was never terminated. The loader
//! repairs exactly those signatures (plus trailing commas), persists the
//! repaired content back best-effort, and re-parses. Anything it cannot
//! match is surfaced as the original parse error; it never guesses
//! records into existence.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::error::Category;
use tracing::{info, warn};

use super::{stats, AggregatedPageStats, ProfileRecord};
use crate::error::{ProfilerError, Result};

/// Everything the detail view needs for one page.
#[derive(Debug, Clone)]
pub struct PageDetail {
    pub page_slug: String,
    /// Path of the newest record, when any record exists.
    pub url: Option<String>,
    /// Newest first.
    pub records: Vec<ProfileRecord>,
    /// Set when there is nothing to show, explaining why.
    pub message: Option<String>,
}

pub struct ProfileRepository {
    dir: PathBuf,
}

impl ProfileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Aggregate statistics for every stored page, newest activity first.
    /// Artifacts that yield zero records are skipped.
    pub fn load_all(&self) -> Result<Vec<AggregatedPageStats>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let records = load_page_log(&path)?;
            if records.is_empty() {
                continue;
            }
            pages.push(aggregate(&path, &records));
        }

        pages.sort_by(|a, b| b.latest_timestamp.cmp(&a.latest_timestamp));
        Ok(pages)
    }

    /// Full record history for one page.
    ///
    /// Resolves the artifact by trying, in order: the doubled extension
    /// a historical writer produced (`<slug>.json.json`), the standard
    /// `<slug>.json`, and the slug verbatim. A missing artifact comes
    /// back as an empty detail with a message rather than an error; a
    /// slug that could escape the storage directory is rejected.
    pub fn load_one(&self, slug: &str) -> Result<PageDetail> {
        if slug.contains('/') || slug.contains('\\') || slug.contains("..") {
            return Err(ProfilerError::Validation(slug.to_string()));
        }

        let standard = if slug.ends_with(".json") {
            slug.to_string()
        } else {
            format!("{slug}.json")
        };
        let candidates = [format!("{slug}.json.json"), standard, slug.to_string()];

        let Some(path) = candidates.iter().map(|name| self.dir.join(name)).find(|p| p.is_file())
        else {
            return Ok(PageDetail {
                page_slug: slug.to_string(),
                url: None,
                records: Vec::new(),
                message: Some("No profiles found for this page".into()),
            });
        };

        let records = load_page_log(&path)?;
        Ok(PageDetail {
            page_slug: slug.to_string(),
            url: records.first().map(|r| r.url.clone()),
            records,
            message: None,
        })
    }
}

fn aggregate(path: &Path, records: &[ProfileRecord]) -> AggregatedPageStats {
    let load_times: Vec<f64> = records.iter().map(|r| r.total_time_ms).collect();
    let sql_times: Vec<f64> = records.iter().map(|r| r.sql_time_ms).collect();
    let query_counts: Vec<f64> = records.iter().map(|r| r.queries.len() as f64).collect();

    let newest = &records[0];
    AggregatedPageStats {
        page_slug: page_slug_of(path),
        url: newest.url.clone(),
        profile_count: records.len(),
        mean_load_time: stats::mean(&load_times),
        median_load_time: stats::median(&load_times),
        p95_load_time: stats::percentile(&load_times, 95.0),
        mean_sql_time: stats::mean(&sql_times),
        mean_sql_queries: stats::mean(&query_counts),
        latest_timestamp: newest.timestamp.clone(),
    }
}

/// `contacts.json` → `contacts`; the historical `contacts.json.json`
/// keeps its inner extension and shows up as `contacts.json`.
fn page_slug_of(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string()
}

/// Load one artifact through the tolerant parser, newest record first.
pub(crate) fn load_page_log(path: &Path) -> Result<Vec<ProfileRecord>> {
    let content = fs::read_to_string(path)?;
    let mut records: Vec<ProfileRecord> = parse_with_auto_fix(path, &content)?;
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(records)
}

fn parse_with_auto_fix(path: &Path, content: &str) -> Result<Vec<ProfileRecord>> {
    let original_err = match serde_json::from_str(content) {
        Ok(records) => return Ok(records),
        Err(err) => err,
    };

    warn!(
        path = %path.display(),
        error = %original_err,
        "JSON parse error, attempting auto-fix"
    );

    let fixed = auto_fix_json(content, &original_err);
    if fixed == content {
        return Err(corruption(path, &original_err));
    }

    // persist the repaired content best-effort before re-parsing
    if let Err(write_err) = fs::write(path, &fixed) {
        warn!(path = %path.display(), error = %write_err, "could not persist repaired JSON");
    }

    match serde_json::from_str(&fixed) {
        Ok(records) => {
            info!(path = %path.display(), "auto-fixed JSON artifact");
            Ok(records)
        }
        // repairs did not help: report the failure we actually observed
        Err(_) => Err(corruption(path, &original_err)),
    }
}

fn corruption(path: &Path, err: &serde_json::Error) -> ProfilerError {
    ProfilerError::Corruption {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

// ─── Repair heuristics ───────────────────────────────────────────
//
// Each fix runs only when its trigger matches the parse error at hand.
// Order matters: structural fixes first, then the unconditional
// trailing-comma sweep.

type Trigger = fn(&serde_json::Error, &str) -> bool;
type Fix = fn(&str) -> String;

const REPAIRS: &[(Trigger, Fix)] = &[
    (doubled_closing_bracket, collapse_trailing_brackets),
    (unterminated_array, close_open_arrays),
    (|_, _| true, strip_trailing_commas),
];

fn auto_fix_json(content: &str, err: &serde_json::Error) -> String {
    let mut fixed = content.to_string();
    for (trigger, fix) in REPAIRS {
        if trigger(err, content) {
            fixed = fix(&fixed);
        }
    }
    fixed
}

/// `[...]]` — a valid document followed by stray `]` tokens.
fn doubled_closing_bracket(err: &serde_json::Error, content: &str) -> bool {
    err.classify() == Category::Syntax && content.trim_end().ends_with("]]")
}

fn collapse_trailing_brackets(content: &str) -> String {
    let body = content.trim_end().trim_end_matches(']').trim_end();
    format!("{body}]\n")
}

/// Input ended before the array was closed.
fn unterminated_array(err: &serde_json::Error, _content: &str) -> bool {
    err.classify() == Category::Eof
}

fn close_open_arrays(content: &str) -> String {
    // naive token count, same as the writer that produced these files
    let opens = content.matches('[').count();
    let closes = content.matches(']').count();
    let mut fixed = content.to_string();
    for _ in closes..opens {
        fixed.push_str("\n]");
    }
    fixed
}

fn strip_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                i += 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────
