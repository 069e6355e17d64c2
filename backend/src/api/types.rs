//! REST API types for the browser visualizations.
//!
//! Field names are camelCase to match what the chart scripts read.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::DatasetSchema;
use crate::geo::RegionFill;
use crate::models::{Measure, RankedEntry, SeriesPoint};
use crate::scale::{Legend, SequentialLegend, ValueExtent};
use crate::transform::pipeline::{DatasetContext, LoadReport};

/// Overview of the loaded dataset, fetched once by the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub schema: DatasetSchema,
    pub years: Vec<i32>,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub extent: Option<ValueExtent>,
    pub country_count: usize,
    pub value_count: usize,
    pub report: LoadReport,
}

impl From<&DatasetContext> for SummaryResponse {
    fn from(ctx: &DatasetContext) -> Self {
        SummaryResponse {
            schema: ctx.schema.clone(),
            years: ctx.index.years().collect(),
            first_year: ctx.index.first_year(),
            last_year: ctx.index.last_year(),
            extent: ctx.extent,
            country_count: ctx.countries().len(),
            value_count: ctx.index.len(),
            report: ctx.report.clone(),
        }
    }
}

/// Treemap input for one year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResponse {
    pub year: i32,
    pub total: f64,
    pub entries: Vec<RankedEntry>,
}

/// Query string of `/api/value`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueQuery {
    pub country: String,
    pub year: i32,
}

/// A single lookup, as shown in tooltips.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueResponse {
    pub country: String,
    pub year: i32,
    pub value: Measure,
    /// Position on the `[max, 0]` color domain, when the value exists
    pub position: Option<f64>,
}

/// A country's time series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub country: String,
    pub points: Vec<SeriesPoint>,
}

/// Which legend `/api/legend` builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendKind {
    /// Evenly spaced breaks from the minimum (treemap)
    #[default]
    Threshold,
    /// Stops over `[max, 0]` (choropleth)
    Sequential,
}

/// Query string of `/api/legend`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegendQuery {
    #[serde(default)]
    pub kind: LegendKind,
    /// Threshold buckets
    pub buckets: Option<usize>,
    /// Sequential stops
    pub stops: Option<usize>,
}

/// A legend, tagged with its kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LegendResponse {
    Threshold(Legend),
    Sequential(SequentialLegend),
}

/// Region fills for one year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionsResponse {
    pub year: i32,
    pub regions: Vec<RegionFill>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_summary_from_context() {
        let ctx = DatasetContext::from_records(
            DatasetSchema::choropleth(),
            vec![
                Record::new("X", 2010, Measure::Value(5.0)),
                Record::new("Y", 2010, Measure::NotAvailable),
                Record::new("X", 2012, Measure::Value(2.0)),
            ],
        );
        let summary = SummaryResponse::from(&ctx);

        assert_eq!(summary.years, vec![2010, 2012]);
        assert_eq!(summary.country_count, 2);
        assert_eq!(summary.value_count, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["firstYear"], 2010);
        assert_eq!(json["schema"]["valueColumn"], "Total");
        assert_eq!(json["report"]["notAvailableRows"], 1);
    }

    #[test]
    fn test_value_response_not_available() {
        let response = ValueResponse {
            country: "Y".into(),
            year: 2010,
            value: Measure::NotAvailable,
            position: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["value"], "not available");
        assert!(json["position"].is_null());
    }

    #[test]
    fn test_legend_response_tagged() {
        let extent = ValueExtent { min: 0.0, max: 10.0 };

        let json = serde_json::to_value(LegendResponse::Sequential(SequentialLegend::new(extent, 3))).unwrap();
        assert_eq!(json["kind"], "sequential");
        assert_eq!(json["stops"], serde_json::json!([10.0, 5.0, 0.0]));

        let json = serde_json::to_value(LegendResponse::Threshold(Legend::new(extent, 2))).unwrap();
        assert_eq!(json["kind"], "threshold");
        assert_eq!(json["thresholds"], serde_json::json!([0.0, 5.0]));
    }

    #[test]
    fn test_error_response() {
        let json = error_response("no geojson configured");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "no geojson configured");
    }
}
