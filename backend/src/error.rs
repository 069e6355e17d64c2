//! Error types for the reshaping pipeline.
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`SchemaError`] - Header does not carry the columns a schema needs
//! - [`GeoError`] - GeoJSON loading errors
//! - [`LoadError`] - Top-level dataset load errors
//! - [`ServerError`] - HTTP server errors
//!
//! Conversion is automatic via `From` implementations so `?` works across
//! error boundaries. Missing values are not errors: they are
//! [`crate::models::Measure::NotAvailable`].

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The header row does not match the configured dataset schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required column is absent from the header row.
    #[error("Missing required column '{column}' (found: {found})")]
    MissingColumn { column: String, found: String },

    /// Unknown schema preset name.
    #[error("Unknown dataset schema '{0}' (expected 'choropleth' or 'gdp')")]
    UnknownPreset(String),
}

// =============================================================================
// GeoJSON Errors
// =============================================================================

/// Errors while loading country geometries.
#[derive(Debug, Error)]
pub enum GeoError {
    /// IO error.
    #[error("Failed to read GeoJSON: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid GeoJSON document.
    #[error("Invalid GeoJSON: {0}")]
    ParseError(#[from] geojson::Error),

    /// Document parsed but is not a FeatureCollection.
    #[error("Expected a FeatureCollection, found {0}")]
    NotACollection(&'static str),
}

// =============================================================================
// Load Errors (top-level)
// =============================================================================

/// Top-level dataset load errors.
///
/// Returned by [`crate::transform::pipeline::load_dataset`]. A load error is
/// terminal for the session: nothing is rendered without a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// GeoJSON error.
    #[error("GeoJSON error: {0}")]
    Geo(#[from] GeoError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Dataset could not be loaded at startup.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket bind or serve failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for GeoJSON operations.
pub type GeoResult<T> = Result<T, GeoError>;

/// Result type for dataset loads.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> LoadError
        let csv_err = CsvError::EmptyFile;
        let load_err: LoadError = csv_err.into();
        assert!(load_err.to_string().contains("empty"));

        // SchemaError -> LoadError -> ServerError
        let schema_err = SchemaError::MissingColumn {
            column: "Total".into(),
            found: "Country, Year".into(),
        };
        let load_err: LoadError = schema_err.into();
        let server_err: ServerError = load_err.into();
        assert!(server_err.to_string().contains("Total"));
    }

    #[test]
    fn test_missing_column_format() {
        let err = SchemaError::MissingColumn {
            column: "GDP per capita".into(),
            found: "Entity, Year".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'GDP per capita'"));
        assert!(msg.contains("Entity, Year"));
    }

    #[test]
    fn test_unknown_preset_format() {
        let err = SchemaError::UnknownPreset("bars".into());
        assert!(err.to_string().contains("'bars'"));
    }
}
