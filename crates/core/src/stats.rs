//! Aggregates for the read-only stats views.

use std::collections::BTreeMap;

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count items grouped by a text key.
pub fn count_by<T, F>(items: &[T], key: F) -> BTreeMap<String, i64>
where
    F: Fn(&T) -> &str,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Seed every known key with zero, then count, so absent states still show.
pub fn count_by_known<T, F>(items: &[T], known: &[&str], key: F) -> BTreeMap<String, i64>
where
    F: Fn(&T) -> &str,
{
    let mut counts: BTreeMap<String, i64> = known.iter().map(|k| (k.to_string(), 0)).collect();
    for (k, n) in count_by(items, key) {
        *counts.entry(k).or_insert(0) += n;
    }
    counts
}

pub fn sum<T, F>(items: &[T], value: F) -> f64
where
    F: Fn(&T) -> f64,
{
    round2(items.iter().map(value).sum())
}

/// Mean of `value` over `items`; zero for an empty slice.
pub fn average<T, F>(items: &[T], value: F) -> f64
where
    F: Fn(&T) -> f64,
{
    if items.is_empty() {
        return 0.0;
    }
    round2(items.iter().map(value).sum::<f64>() / items.len() as f64)
}
