//! Dataset schemas and runtime configuration.
//!
//! Each visualization reads a differently shaped CSV, so the column names
//! live in a [`DatasetSchema`] instead of being hardcoded in the reshaper.
//! Server settings come from the environment (a `.env` file is loaded by the
//! binary) and can be overridden by CLI flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SchemaError;

/// Cell text that marks a missing value in the source datasets.
pub const NA_SENTINEL: &str = "NA";

/// Last year shown on the choropleth; the 2022 rows are incomplete.
pub const CHOROPLETH_MAX_YEAR: i32 = 2021;

/// Default number of legend buckets.
pub const DEFAULT_LEGEND_BUCKETS: usize = 5;

/// Default number of stops on the choropleth's sequential legend.
pub const DEFAULT_SEQUENTIAL_STOPS: usize = 6;

/// Upper bound on legend buckets or sequential stops.
pub const MAX_LEGEND_BUCKETS: usize = 20;

/// Default GeoJSON property holding the country name.
pub const DEFAULT_GEO_NAME_PROPERTY: &str = "admin";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Column names of the three fields every record needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSchema {
    pub country_column: String,
    pub year_column: String,
    pub value_column: String,
}

impl DatasetSchema {
    pub fn new(
        country_column: impl Into<String>,
        year_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            country_column: country_column.into(),
            year_column: year_column.into(),
            value_column: value_column.into(),
        }
    }

    /// Annual migration totals per country (choropleth map).
    pub fn choropleth() -> Self {
        Self::new("Country", "Year", "Total")
    }

    /// GDP per capita per entity (treemap).
    pub fn gdp() -> Self {
        Self::new("Entity", "Year", "GDP per capita")
    }

    /// Required columns in (country, year, value) order.
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.country_column, &self.year_column, &self.value_column]
    }
}

/// Named schema presets, selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPreset {
    Choropleth,
    Gdp,
}

impl SchemaPreset {
    pub fn schema(self) -> DatasetSchema {
        match self {
            SchemaPreset::Choropleth => DatasetSchema::choropleth(),
            SchemaPreset::Gdp => DatasetSchema::gdp(),
        }
    }

    /// Load options the original view applies to its dataset.
    pub fn load_options(self) -> LoadOptions {
        match self {
            SchemaPreset::Choropleth => LoadOptions {
                schema: self.schema(),
                max_year: Some(CHOROPLETH_MAX_YEAR),
                ..LoadOptions::default()
            },
            SchemaPreset::Gdp => LoadOptions {
                schema: self.schema(),
                ..LoadOptions::default()
            },
        }
    }
}

impl FromStr for SchemaPreset {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "choropleth" | "migration" => Ok(SchemaPreset::Choropleth),
            "gdp" | "treemap" => Ok(SchemaPreset::Gdp),
            other => Err(SchemaError::UnknownPreset(other.to_string())),
        }
    }
}

/// Options for loading a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    /// Column mapping
    pub schema: DatasetSchema,

    /// Drop rows whose year is greater than this
    pub max_year: Option<i32>,

    /// Force a delimiter instead of auto-detecting it
    pub delimiter: Option<char>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema: DatasetSchema::choropleth(),
            max_year: None,
            delimiter: None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub dataset: Option<PathBuf>,
    pub preset: SchemaPreset,
    pub geojson: Option<PathBuf>,
    pub geo_name_property: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            dataset: None,
            preset: SchemaPreset::Choropleth,
            geojson: None,
            geo_name_property: DEFAULT_GEO_NAME_PROPERTY.to_string(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Read settings from `RESHAPER_*` environment variables.
    ///
    /// Unset or unparseable variables keep their defaults; an unknown
    /// schema name is an error.
    pub fn from_env() -> Result<Self, SchemaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, SchemaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("RESHAPER_PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Some(preset) = lookup("RESHAPER_SCHEMA") {
            config.preset = preset.parse()?;
        }
        if let Some(property) = lookup("RESHAPER_GEO_PROPERTY") {
            config.geo_name_property = property;
        }
        config.dataset = lookup("RESHAPER_DATASET").map(PathBuf::from);
        config.geojson = lookup("RESHAPER_GEOJSON").map(PathBuf::from);
        config.static_dir = lookup("RESHAPER_STATIC_DIR").map(PathBuf::from);

        Ok(config)
    }
}
