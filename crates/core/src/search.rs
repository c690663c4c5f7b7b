//! Paging and sorting rules shared by every search and export.

/// Rows a search returns when the caller gives no `limit`.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Hard ceiling on `limit` for searches.
pub const MAX_SEARCH_LIMIT: i64 = 500;

/// Row cap for exports, which re-run the search unpaged.
pub const EXPORT_MAX_ROWS: i64 = 10_000;

/// A resolved window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Resolve caller-supplied paging. A missing limit takes `default`; any
    /// limit is held within `1..=max` and offsets below zero become zero.
    pub fn resolve(limit: Option<i64>, offset: Option<i64>, default: i64, max: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default).clamp(1, max.max(1)),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// The requested sort column when it is allow-listed, else `default`.
/// Requested names are only ever compared, never passed through.
pub fn resolve_sort_column(
    requested: Option<&str>,
    allowed: &[&'static str],
    default: &'static str,
) -> &'static str {
    let Some(requested) = requested.map(str::trim) else {
        return default;
    };
    allowed
        .iter()
        .copied()
        .find(|column| *column == requested)
        .unwrap_or(default)
}
