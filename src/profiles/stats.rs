//! Order statistics over the small per-page sample sets.
//!
//! Page logs hold at most `retention_count` records, so exact
//! sort-based statistics are cheaper and more precise than any
//! histogram sketch would be.

use super::round2;

/// Arithmetic mean, rounded to 2 decimals. `0.0` for an empty set.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median: middle element for odd counts, average of the two middle
/// elements otherwise. `0.0` for an empty set.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = ascending(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        round2(sorted[mid])
    } else {
        round2((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Percentile by rank: `index = ceil(p/100 * n) - 1`, clamped at 0.
/// `0.0` for an empty set.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = ascending(values);
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as isize - 1;
    let index = rank.max(0) as usize;
    round2(sorted[index.min(sorted.len() - 1)])
}

fn ascending(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

// ─── Tests ───────────────────────────────────────────────────────
