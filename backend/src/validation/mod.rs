//! Typing raw CSV rows against a [`DatasetSchema`].
//!
//! Two levels of checking:
//!
//! - **Header**: a required column missing from the header row fails the
//!   whole load ([`check_headers`]).
//! - **Row**: a row with an empty country or an unparseable year is skipped
//!   and reported as a [`SkippedRow`] ([`validate_row`]).
//!
//! A non-numeric value cell is neither: it is a normal row whose value is
//! [`Measure::NotAvailable`].

use serde::Serialize;

use crate::config::DatasetSchema;
use crate::error::SchemaError;
use crate::models::{Measure, Record};
use crate::parser::RawRecord;

/// A row that was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// Result of validating every row of a dataset.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

/// Ensure every column the schema needs is present in `headers`.
pub fn check_headers(headers: &[String], schema: &DatasetSchema) -> Result<(), SchemaError> {
    for column in schema.required_columns() {
        if !headers.iter().any(|h| h == column) {
            return Err(SchemaError::MissingColumn {
                column: column.to_string(),
                found: headers.join(", "),
            });
        }
    }
    Ok(())
}

/// Type one row.
pub fn validate_row(row: &RawRecord, schema: &DatasetSchema) -> Result<Record, SkippedRow> {
    let skip = |reason: String| SkippedRow {
        line: row.line,
        reason,
    };

    let country = row
        .get(&schema.country_column)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| skip(format!("empty '{}'", schema.country_column)))?;

    let raw_year = row.get(&schema.year_column).map(str::trim).unwrap_or("");
    let year = parse_year(raw_year)
        .ok_or_else(|| skip(format!("invalid '{}' value '{}'", schema.year_column, raw_year)))?;

    let value = row
        .get(&schema.value_column)
        .map(Measure::parse)
        .unwrap_or(Measure::NotAvailable);

    Ok(Record::new(country, year, value))
}

/// Type every row, keeping source order.
pub fn validate_rows(rows: &[RawRecord], schema: &DatasetSchema) -> Validated {
    let mut validated = Validated::default();

    for row in rows {
        match validate_row(row, schema) {
            Ok(record) => validated.records.push(record),
            Err(skipped) => validated.skipped.push(skipped),
        }
    }

    validated
}

/// Years are integers; spreadsheets sometimes export them as `2010.0`.
fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let float: f64 = raw.parse().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() <= i32::MAX as f64 {
        Some(float as i32)
    } else {
        None
    }
}
