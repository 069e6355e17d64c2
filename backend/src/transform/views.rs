//! Derived views over a loaded dataset.
//!
//! - [`ranked`]: one year's entries, largest first, for hierarchy layouts
//! - [`country_series`]: one country's available values over time

use std::cmp::Ordering;

use super::reshaper::YearIndex;
use crate::models::{RankedEntry, Record, SeriesPoint};

/// Entries of `year`, largest value first.
///
/// Ties keep source order. Each entry carries its share of the year's total
/// (zero when the total is zero).
pub fn ranked(index: &YearIndex, year: i32) -> Vec<RankedEntry> {
    let mut entries: Vec<_> = index.entries(year).iter().collect();
    // Stable sort, so equal values stay in source order.
    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let total: f64 = entries.iter().map(|e| e.value).sum();

    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            rank: i + 1,
            country: e.country.clone(),
            value: e.value,
            share: if total != 0.0 { e.value / total } else { 0.0 },
        })
        .collect()
}

/// Available `(year, value)` points of `country`, in source order.
pub fn country_series(records: &[Record], country: &str) -> Vec<SeriesPoint> {
    records
        .iter()
        .filter(|r| r.country == country)
        .filter_map(|r| {
            r.value.value().map(|value| SeriesPoint {
                year: r.year,
                value,
            })
        })
        .collect()
}

/// Distinct country names in first-seen order.
pub fn countries(records: &[Record]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .map(|r| r.country.as_str())
        .filter(|c| seen.insert(*c))
        .collect()
}
