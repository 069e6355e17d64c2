//! Domain models for the reshaping pipeline.
//!
//! - [`Measure`] - A numeric value or "not available"
//! - [`Record`] - One validated CSV row
//! - [`YearEntry`] - One country's value inside a year group
//! - [`RankedEntry`] - A year entry with its rank, for hierarchy layouts
//! - [`SeriesPoint`] - One point of a country's time series

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::config::NA_SENTINEL;

// =============================================================================
// Measure
// =============================================================================

/// Text used when a value is missing, in JSON output and tooltips.
pub const NOT_AVAILABLE: &str = "not available";

/// A data point that is either a finite number or missing.
///
/// Zero is a value. Missing data never collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Measure {
    Value(f64),
    #[default]
    NotAvailable,
}

impl Measure {
    /// Coerce a CSV cell.
    ///
    /// Empty cells, the `NA` sentinel, unparseable text and non-finite
    /// numbers are all not available.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NA_SENTINEL) {
            return Measure::NotAvailable;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Measure::Value(v),
            _ => Measure::NotAvailable,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Value(v) => Some(v),
            Measure::NotAvailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Measure::Value(_))
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measure::NotAvailable, Measure::Value)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Value(v) => write!(f, "{}", v),
            Measure::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Value(v) => serializer.serialize_f64(*v),
            Measure::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Measure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MeasureVisitor;

        impl de::Visitor<'_> for MeasureVisitor {
            type Value = Measure;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a number or \"{}\"", NOT_AVAILABLE)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Measure, E> {
                Ok(Measure::Value(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Measure, E> {
                Ok(Measure::Value(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Measure, E> {
                Ok(Measure::Value(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Measure, E> {
                Ok(Measure::parse(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Measure, E> {
                Ok(Measure::NotAvailable)
            }
        }

        deserializer.deserialize_any(MeasureVisitor)
    }
}

// =============================================================================
// Records
// =============================================================================

/// One validated CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    pub year: i32,
    pub value: Measure,
}

impl Record {
    pub fn new(country: impl Into<String>, year: i32, value: Measure) -> Self {
        Self {
            country: country.into(),
            year,
            value,
        }
    }
}

/// One country's value inside a year group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearEntry {
    pub country: String,
    pub value: f64,
}

/// A year entry placed by value, largest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub country: String,
    pub value: f64,
    /// Share of the year's total, in `0.0..=1.0`
    pub share: f64,
}

/// One available point of a country's series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(Measure::parse("5"), Measure::Value(5.0));
        assert_eq!(Measure::parse(" 1234.5 "), Measure::Value(1234.5));
        assert_eq!(Measure::parse("-3"), Measure::Value(-3.0));
        assert_eq!(Measure::parse("0"), Measure::Value(0.0));
    }

    #[test]
    fn test_parse_missing() {
        assert_eq!(Measure::parse("NA"), Measure::NotAvailable);
        assert_eq!(Measure::parse("na"), Measure::NotAvailable);
        assert_eq!(Measure::parse(""), Measure::NotAvailable);
        assert_eq!(Measure::parse("   "), Measure::NotAvailable);
        assert_eq!(Measure::parse("n/a"), Measure::NotAvailable);
        assert_eq!(Measure::parse("NaN"), Measure::NotAvailable);
        assert_eq!(Measure::parse("inf"), Measure::NotAvailable);
    }

    #[test]
    fn test_json_format() {
        assert_eq!(serde_json::to_value(Measure::Value(5.0)).unwrap(), json!(5.0));
        assert_eq!(
            serde_json::to_value(Measure::NotAvailable).unwrap(),
            json!("not available")
        );

        let back: Measure = serde_json::from_value(json!("not available")).unwrap();
        assert_eq!(back, Measure::NotAvailable);
        let back: Measure = serde_json::from_value(json!(12)).unwrap();
        assert_eq!(back, Measure::Value(12.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Measure::Value(5.0).to_string(), "5");
        assert_eq!(Measure::NotAvailable.to_string(), "not available");
    }
}
