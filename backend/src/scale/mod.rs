//! Value domains and legend breaks.
//!
//! The browser picks actual colors; this module only decides where a value
//! falls: its position on a sequential domain (choropleth) or its bucket
//! among evenly spaced thresholds (treemap legend).

use serde::Serialize;

use crate::config::MAX_LEGEND_BUCKETS;
use crate::models::Measure;
use crate::transform::reshaper::YearIndex;

/// Smallest and largest available value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueExtent {
    pub min: f64,
    pub max: f64,
}

impl ValueExtent {
    /// Extent of all values in the index, `None` when it holds no values.
    pub fn of_index(index: &YearIndex) -> Option<Self> {
        Self::of_values(index.iter().map(|(_, _, v)| v))
    }

    pub fn of_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(ValueExtent { min: v, max: v }),
            Some(e) => Some(ValueExtent {
                min: e.min.min(v),
                max: e.max.max(v),
            }),
        })
    }

    /// Position of `value` on a `[max, 0]` domain: 0.0 at the maximum,
    /// 1.0 at zero, clamped.
    pub fn sequential_position(&self, value: f64) -> f64 {
        if self.max == 0.0 {
            return 0.0;
        }
        ((self.max - value) / self.max).clamp(0.0, 1.0)
    }
}

/// `buckets` evenly spaced breaks starting at `extent.min`, at most
/// [`MAX_LEGEND_BUCKETS`].
///
/// A flat extent yields the single break `min`.
pub fn thresholds(extent: ValueExtent, buckets: usize) -> Vec<f64> {
    let buckets = buckets.min(MAX_LEGEND_BUCKETS);
    let span = extent.max - extent.min;
    if buckets == 0 || span <= 0.0 {
        return vec![extent.min];
    }
    let step = span / buckets as f64;
    (0..buckets).map(|i| extent.min + i as f64 * step).collect()
}

/// Labels for each break, closing with the maximum.
///
/// The first reads `≥ $a`, the last `< $max`, the rest `$a - $b`.
pub fn legend_labels(thresholds: &[f64], max: f64) -> Vec<String> {
    let values: Vec<f64> = thresholds.iter().copied().chain(std::iter::once(max)).collect();
    let last = values.len() - 1;

    values
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            if i == 0 {
                format!("≥ ${}", format_thousands(current))
            } else if i == last {
                format!("< ${}", format_thousands(current))
            } else {
                format!(
                    "${} - ${}",
                    format_thousands(current),
                    format_thousands(values[i + 1] - 1.0)
                )
            }
        })
        .collect()
}

/// Round to a whole number and group digits by thousands: `1234567.8` →
/// `1,234,568`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Threshold breaks with their labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub extent: ValueExtent,
    pub thresholds: Vec<f64>,
    pub labels: Vec<String>,
}

impl Legend {
    pub fn new(extent: ValueExtent, buckets: usize) -> Self {
        let thresholds = thresholds(extent, buckets);
        let labels = legend_labels(&thresholds, extent.max);
        Self {
            extent,
            thresholds,
            labels,
        }
    }

    /// Number of breaks at or below `value`, i.e. the color slot it falls
    /// in. Not-available values have no bucket.
    pub fn bucket_for(&self, value: Measure) -> Option<usize> {
        let v = value.value()?;
        Some(self.thresholds.partition_point(|&t| t <= v))
    }
}

/// `count` evenly spaced stops from `max` down to 0, largest first.
///
/// `count` is kept within `2..=MAX_LEGEND_BUCKETS` so both ends are present.
pub fn sequential_stops(max: f64, count: usize) -> Vec<f64> {
    let count = count.clamp(2, MAX_LEGEND_BUCKETS);
    let steps = (count - 1) as f64;
    (0..count).map(|i| max + i as f64 * (0.0 - max) / steps).collect()
}

/// Labels for sequential stops: `< a` on the first, `> z` on the last and
/// `a - b` from the previous stop in between.
pub fn sequential_labels(stops: &[f64]) -> Vec<String> {
    let last = stops.len().saturating_sub(1);

    stops
        .iter()
        .enumerate()
        .map(|(i, &stop)| {
            if i == 0 {
                format!("< {}", round_half_up(stop))
            } else if i == last {
                format!("> {}", round_half_up(stop))
            } else {
                format!("{} - {}", round_half_up(stops[i - 1]), round_half_up(stop))
            }
        })
        .collect()
}

/// Round halves toward positive infinity, as the browser's `Math.round`.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Stops of the choropleth's `[max, 0]` color domain with their labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequentialLegend {
    pub max: f64,
    pub stops: Vec<f64>,
    pub labels: Vec<String>,
}

impl SequentialLegend {
    pub fn new(extent: ValueExtent, stops: usize) -> Self {
        let stops = sequential_stops(extent.max, stops);
        let labels = sequential_labels(&stops);
        Self {
            max: extent.max,
            stops,
            labels,
        }
    }
}
