//! Run ID generation
//!
//! All run IDs use the format: `{YYYYMMDD_HHMMSS}_{slug}`
//! Example: `20260314_093012_todo-fixme`
//!
//! The timestamp is UTC so that lexical order equals creation order.

use chrono::{DateTime, Utc};

/// Timestamp prefix format (second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Maximum slug length in characters
pub const SLUG_MAX_LEN: usize = 40;

/// Generate the candidate run ID for a tool invocation
///
/// Same `(tool, query, now)` always gives the same candidate; collision
/// suffixes are added later by the store.
pub fn generate_run_id(tool: &str, query: &str, now: &DateTime<Utc>) -> String {
    let mut slug = slugify(query);
    if slug.is_empty() {
        slug = slugify(tool);
    }
    if slug.is_empty() {
        slug = "run".to_string();
    }
    format!("{}_{}", now.format(TIMESTAMP_FORMAT), slug)
}

/// Append a collision suffix (`_2`, `_3`, ...) to a candidate ID
pub fn with_suffix(candidate: &str, attempt: u32) -> String {
    if attempt <= 1 {
        candidate.to_string()
    } else {
        format!("{}_{}", candidate, attempt)
    }
}

/// Slugify a query for use in run IDs
pub fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.len() <= SLUG_MAX_LEN {
        return slug;
    }
    slug[..SLUG_MAX_LEN].trim_end_matches('-').to_string()
}

/// Check that a run ID names a single directory under the runs root
pub fn is_safe_run_id(run_id: &str) -> bool {
    !run_id.is_empty()
        && run_id != "."
        && run_id != ".."
        && !run_id.contains('/')
        && !run_id.contains('\\')
        && !run_id.contains("..")
}
