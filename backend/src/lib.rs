//! # Reshaper - year/country datasets for choropleth and treemap views
//!
//! Loads CSV datasets once, types each row against a column schema, and
//! groups the values by year and country so the browser charts can look
//! them up while the user drags the year slider.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│ Validation  │────▶│  YearIndex  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  (schema)   │     │ (+ lookup)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reshaper::{load_dataset, SchemaPreset};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = SchemaPreset::Gdp.load_options();
//!     let ctx = load_dataset("gdp.csv".as_ref(), &options).await.unwrap();
//!     println!("{} values", ctx.index.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Dataset schemas and server settings
//! - [`models`] - Records and the "value or not available" measure
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Header and row checks
//! - [`transform`] - Reshaper, derived views and load pipeline
//! - [`scale`] - Value extent and legend thresholds
//! - [`geo`] - GeoJSON region join
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;
pub mod validation;

// Transformation
pub mod transform;

// Presentation helpers
pub mod geo;
pub mod scale;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{DatasetSchema, LoadOptions, SchemaPreset, ServerConfig};

pub use error::{CsvError, GeoError, LoadError, SchemaError, ServerError};

pub use models::{Measure, RankedEntry, Record, SeriesPoint, YearEntry, NOT_AVAILABLE};

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    ParseResult, RawRecord,
};

pub use validation::{check_headers, validate_row, validate_rows, SkippedRow};

pub use transform::{
    country_series, load_bytes, load_dataset, ranked, reshape, DatasetContext, LoadReport,
    YearIndex,
};

pub use scale::{Legend, SequentialLegend, ValueExtent};

pub use geo::{fill_for_year, load_regions, parse_regions, Region, RegionFill};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
