//! Country shapes for the choropleth.
//!
//! Only the region names matter here: geometry and projection stay in the
//! browser. A feature's name comes from one of its properties (`admin` in
//! Natural Earth exports) and is matched verbatim against dataset countries.

use geojson::GeoJson;
use serde::Serialize;
use std::path::Path;

use crate::api::logs::log_warning;
use crate::error::{GeoError, GeoResult};
use crate::models::Measure;
use crate::transform::reshaper::YearIndex;

/// A named feature of the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Position of the feature in the collection
    pub feature_index: usize,
    pub name: String,
}

/// A region with the value it should be shaded by.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFill {
    pub feature_index: usize,
    pub name: String,
    pub value: Measure,
}

/// Extract region names from GeoJSON text.
///
/// Features without a string `name_property` are left out.
pub fn parse_regions(content: &str, name_property: &str) -> GeoResult<Vec<Region>> {
    let geojson: GeoJson = content.parse()?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(GeoError::NotACollection("Feature")),
        GeoJson::Geometry(_) => return Err(GeoError::NotACollection("Geometry")),
    };

    let mut unnamed = 0;
    let regions: Vec<Region> = collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(i, feature)| {
            let name = feature.property(name_property).and_then(|v| v.as_str());
            if name.is_none() {
                unnamed += 1;
            }
            name.map(|n| Region {
                feature_index: i,
                name: n.to_string(),
            })
        })
        .collect();

    if unnamed > 0 {
        log_warning(format!(
            "{} feature(s) without a '{}' property ignored",
            unnamed, name_property
        ));
    }

    Ok(regions)
}

/// Read and parse a GeoJSON file.
pub async fn load_regions(path: &Path, name_property: &str) -> GeoResult<Vec<Region>> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_regions(&content, name_property)
}

/// Join regions with the values of `year`.
///
/// Regions with no matching record get not available.
pub fn fill_for_year(regions: &[Region], index: &YearIndex, year: i32) -> Vec<RegionFill> {
    regions
        .iter()
        .map(|r| RegionFill {
            feature_index: r.feature_index,
            name: r.name.clone(),
            value: index.value_for(&r.name, year),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::transform::reshaper::reshape;

    const WORLD: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "admin": "France" },
              "geometry": { "type": "Point", "coordinates": [2.0, 46.0] } },
            { "type": "Feature", "properties": { "name": "Nowhere" },
              "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
            { "type": "Feature", "properties": { "admin": "Chad" },
              "geometry": { "type": "Point", "coordinates": [18.0, 15.0] } }
        ]
    }"#;

    #[test]
    fn test_parse_regions() {
        let regions = parse_regions(WORLD, "admin").unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0], Region { feature_index: 0, name: "France".into() });
        assert_eq!(regions[1], Region { feature_index: 2, name: "Chad".into() });
    }

    #[test]
    fn test_not_a_collection() {
        let point = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(matches!(
            parse_regions(point, "admin"),
            Err(GeoError::NotACollection("Geometry"))
        ));
        assert!(matches!(parse_regions("{", "admin"), Err(GeoError::ParseError(_))));
    }

    #[test]
    fn test_fill_for_year() {
        let regions = parse_regions(WORLD, "admin").unwrap();
        let index = reshape(&vec![
            Record::new("France", 2015, Measure::Value(120.0)),
            Record::new("Chad", 2015, Measure::NotAvailable),
        ]);

        let fills = fill_for_year(&regions, &index, 2015);
        assert_eq!(fills[0].value, Measure::Value(120.0));
        assert_eq!(fills[1].value, Measure::NotAvailable);

        let fills = fill_for_year(&regions, &index, 1990);
        assert!(fills.iter().all(|f| f.value == Measure::NotAvailable));
    }

    #[tokio::test]
    async fn test_load_regions_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.geo.json");
        std::fs::write(&path, WORLD).unwrap();

        let regions = load_regions(&path, "admin").await.unwrap();
        assert_eq!(regions.len(), 2);
    }
}
