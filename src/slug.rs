//! Request path → filesystem-safe storage key.
//!
//! `/contacts`     → `contacts`
//! `/contacts/123` → `contacts_123`
//! `/`             → `root`
//!
//! Two distinct URLs can map to the same slug (e.g. `/a-b` and `/a/b`);
//! their profiles then interleave in one page log. Accepted trade-off for
//! a local tool.

/// Derive the storage slug for a request path. Pure and deterministic.
///
/// Every character outside `[a-zA-Z0-9_]` (path separators included)
/// becomes an underscore, runs of underscores collapse to one, leading
/// and trailing underscores are trimmed, and the result is lower-cased.
/// The bare root path yields `"root"`.
pub fn slug_for(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut prev_underscore = false;

    for ch in url.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.to_string()
    }
}

// ─── Tests ───────────────────────────────────────────────────────
