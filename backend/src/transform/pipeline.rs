//! Load a dataset into a [`DatasetContext`].
//!
//! Combines every step: reading, decoding, parsing, header check, row
//! validation, year cutoff, reshaping and extent.
//!
//! # Example
//!
//! ```rust,ignore
//! use reshaper::config::SchemaPreset;
//! use reshaper::transform::pipeline::load_dataset;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SchemaPreset::Choropleth.load_options();
//!     let ctx = load_dataset(Path::new("choropleth_map.csv"), &options).await?;
//!
//!     println!("France 2010: {}", ctx.value_for("France", 2010));
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::reshaper::{reshape, YearIndex};
use super::views;
use crate::api::logs::{log_info, log_row_warning, log_success, log_warning};
use crate::config::{DatasetSchema, LoadOptions};
use crate::error::{CsvError, LoadResult};
use crate::models::{Measure, RankedEntry, Record, SeriesPoint};
use crate::parser::{parse_bytes_auto, ParseResult};
use crate::scale::ValueExtent;
use crate::validation::{check_headers, validate_rows, SkippedRow};

/// Skipped rows logged one by one before switching to a total.
const SKIPPED_ROWS_SHOWN: usize = 5;

/// What happened to each row of the source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    /// Data rows read from the file
    pub total_rows: usize,
    /// Rows typed into records
    pub kept_rows: usize,
    /// Kept rows whose value is not available
    pub not_available_rows: usize,
    /// Rows dropped by the year cutoff
    pub after_cutoff_rows: usize,
    /// Malformed rows
    pub skipped: Vec<SkippedRow>,
}

/// A loaded dataset. Built once, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetContext {
    pub schema: DatasetSchema,
    /// Kept records in source order
    #[serde(skip)]
    pub records: Vec<Record>,
    pub index: YearIndex,
    pub extent: Option<ValueExtent>,
    pub report: LoadReport,
}

impl DatasetContext {
    /// Build a context from already typed records.
    pub fn from_records(schema: DatasetSchema, records: Vec<Record>) -> Self {
        let index = reshape(&records);
        let extent = ValueExtent::of_index(&index);
        let report = LoadReport {
            total_rows: records.len(),
            kept_rows: records.len(),
            not_available_rows: records.iter().filter(|r| !r.value.is_available()).count(),
            ..LoadReport::default()
        };
        Self {
            schema,
            records,
            index,
            extent,
            report,
        }
    }

    pub fn value_for(&self, country: &str, year: i32) -> Measure {
        self.index.value_for(country, year)
    }

    pub fn ranked(&self, year: i32) -> Vec<RankedEntry> {
        views::ranked(&self.index, year)
    }

    pub fn series(&self, country: &str) -> Vec<SeriesPoint> {
        views::country_series(&self.records, country)
    }

    pub fn countries(&self) -> Vec<&str> {
        views::countries(&self.records)
    }
}

/// Read and load a CSV file.
pub async fn load_dataset(path: &Path, options: &LoadOptions) -> LoadResult<DatasetContext> {
    log_info(format!("Reading {}", path.display()));
    let bytes = tokio::fs::read(path).await.map_err(CsvError::from)?;
    load_bytes(&bytes, options)
}

/// Load CSV bytes.
pub fn load_bytes(bytes: &[u8], options: &LoadOptions) -> LoadResult<DatasetContext> {
    let parsed = parse_bytes_auto(bytes, options.delimiter)?;
    log_success(format!(
        "Encoding {}, delimiter '{}', {} rows",
        parsed.encoding,
        format_delimiter(parsed.delimiter),
        parsed.records.len()
    ));
    load_parsed(parsed, options)
}

/// Load already parsed rows.
pub fn load_parsed(parsed: ParseResult, options: &LoadOptions) -> LoadResult<DatasetContext> {
    check_headers(&parsed.headers, &options.schema)?;

    let validated = validate_rows(&parsed.records, &options.schema);
    report_skipped(&validated.skipped);

    let kept_before_cutoff = validated.records.len();
    let records: Vec<Record> = match options.max_year {
        Some(max_year) => validated
            .records
            .into_iter()
            .filter(|r| r.year <= max_year)
            .collect(),
        None => validated.records,
    };
    let after_cutoff_rows = kept_before_cutoff - records.len();
    if let Some(max_year) = options.max_year {
        if after_cutoff_rows > 0 {
            log_info(format!("{} rows after {} dropped", after_cutoff_rows, max_year));
        }
    }

    let index = reshape(&records);
    let extent = ValueExtent::of_index(&index);
    let not_available_rows = records.iter().filter(|r| !r.value.is_available()).count();

    log_success(format!(
        "{} values over {} years ({} not available)",
        index.len(),
        index.years().count(),
        not_available_rows
    ));

    let report = LoadReport {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.headers,
        total_rows: parsed.records.len(),
        kept_rows: records.len(),
        not_available_rows,
        after_cutoff_rows,
        skipped: validated.skipped,
    };

    Ok(DatasetContext {
        schema: options.schema.clone(),
        records,
        index,
        extent,
        report,
    })
}

fn report_skipped(skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    log_warning(format!("{} malformed rows skipped", skipped.len()));
    for row in skipped.iter().take(SKIPPED_ROWS_SHOWN) {
        log_row_warning(row.line, row.reason.clone());
    }
    if skipped.len() > SKIPPED_ROWS_SHOWN {
        log_warning(format!("... and {} more", skipped.len() - SKIPPED_ROWS_SHOWN));
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaPreset;
    use crate::error::{LoadError, SchemaError};

    const MIGRATION: &str = "Country,Year,Total\n\
        France,2010,5\n\
        Chad,2010,NA\n\
        ,2010,9\n\
        Peru,20x0,4\n\
        France,2021,0\n\
        France,2022,8\n";

    #[test]
    fn test_na_and_absent_lookups() {
        let csv = "Country,Year,Total\nX,2010,5\nY,2010,NA\n";
        let ctx = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(ctx.value_for("X", 2010), Measure::Value(5.0));
        assert_eq!(ctx.value_for("Y", 2010), Measure::NotAvailable);
        assert_eq!(ctx.value_for("Z", 2010), Measure::NotAvailable);
    }

    #[test]
    fn test_report_counts() {
        let ctx = load_bytes(MIGRATION.as_bytes(), &SchemaPreset::Choropleth.load_options()).unwrap();
        let report = &ctx.report;

        assert_eq!(report.total_rows, 6);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].line, 4);
        assert_eq!(report.skipped[1].line, 5);
        assert_eq!(report.after_cutoff_rows, 1);
        assert_eq!(report.kept_rows, 3);
        assert_eq!(report.not_available_rows, 1);
    }

    #[test]
    fn test_skipped_line_after_blank_lines() {
        let csv = "Country,Year,Total\nFrance,2010,5\n\n\nPeru,20x0,4\n";
        let ctx = load_bytes(csv.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(ctx.report.skipped.len(), 1);
        assert_eq!(ctx.report.skipped[0].line, 5);
    }

    #[test]
    fn test_accented_country_lookup() {
        let csv = "Entity,Year,GDP per capita\nRéunion,2010,20000\n";
        let ctx = load_bytes(csv.as_bytes(), &SchemaPreset::Gdp.load_options()).unwrap();

        assert_eq!(ctx.report.encoding, "utf-8");
        assert_eq!(ctx.value_for("Réunion", 2010), Measure::Value(20000.0));
        assert_eq!(ctx.countries(), vec!["Réunion"]);
    }

    #[test]
    fn test_max_year_cutoff() {
        let ctx = load_bytes(MIGRATION.as_bytes(), &SchemaPreset::Choropleth.load_options()).unwrap();

        assert_eq!(ctx.value_for("France", 2021), Measure::Value(0.0));
        assert_eq!(ctx.value_for("France", 2022), Measure::NotAvailable);
        assert_eq!(ctx.index.last_year(), Some(2021));

        let uncapped = load_bytes(MIGRATION.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(uncapped.value_for("France", 2022), Measure::Value(8.0));
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let csv = "Entity,Year,Total\nX,2010,5\n";
        let err = load_bytes(csv.as_bytes(), &SchemaPreset::Gdp.load_options()).unwrap_err();

        match err {
            LoadError::Schema(SchemaError::MissingColumn { column, .. }) => {
                assert_eq!(column, "GDP per capita")
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset() {
        let ctx = load_bytes(b"Country,Year,Total\n", &LoadOptions::default()).unwrap();

        assert!(ctx.index.is_empty());
        assert_eq!(ctx.extent, None);
        assert_eq!(ctx.value_for("X", 2010), Measure::NotAvailable);
    }

    #[test]
    fn test_empty_file_is_error() {
        assert!(matches!(
            load_bytes(b"", &LoadOptions::default()),
            Err(LoadError::Csv(CsvError::EmptyFile))
        ));
    }

    #[test]
    fn test_gdp_treemap_and_series() {
        let csv = "Entity,Code,Year,GDP per capita\n\
            Chad,TCD,2010,1500\n\
            Norway,NOR,2010,60000\n\
            Chad,TCD,2011,1550\n";
        let ctx = load_bytes(csv.as_bytes(), &SchemaPreset::Gdp.load_options()).unwrap();

        let ranked = ctx.ranked(2010);
        assert_eq!(ranked[0].country, "Norway");
        assert_eq!(ranked[1].country, "Chad");

        let series = ctx.series("Chad");
        assert_eq!(series.len(), 2);
        assert_eq!(series[1], SeriesPoint { year: 2011, value: 1550.0 });

        assert_eq!(ctx.extent, Some(ValueExtent { min: 1500.0, max: 60000.0 }));
        assert_eq!(ctx.countries(), vec!["Chad", "Norway"]);
    }

    #[test]
    fn test_idempotent_load() {
        let options = SchemaPreset::Choropleth.load_options();
        let a = load_bytes(MIGRATION.as_bytes(), &options).unwrap();
        let b = load_bytes(MIGRATION.as_bytes(), &options).unwrap();

        assert_eq!(a.index, b.index);
        assert_eq!(a.records, b.records);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_from_records() {
        let ctx = DatasetContext::from_records(
            DatasetSchema::gdp(),
            vec![
                Record::new("A", 2000, Measure::Value(2.0)),
                Record::new("B", 2000, Measure::NotAvailable),
            ],
        );
        assert_eq!(ctx.report.kept_rows, 2);
        assert_eq!(ctx.report.not_available_rows, 1);
        assert_eq!(ctx.index.len(), 1);
    }

    #[tokio::test]
    async fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choropleth_map.csv");
        std::fs::write(&path, MIGRATION).unwrap();

        let ctx = load_dataset(&path, &SchemaPreset::Choropleth.load_options())
            .await
            .unwrap();
        assert_eq!(ctx.value_for("France", 2010), Measure::Value(5.0));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/data.csv"), &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Csv(CsvError::IoError(_))));
    }
}
