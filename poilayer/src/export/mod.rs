//! Result export in CSV, JSON, and GeoJSON.
//!
//! The renderers are pure string builders over a record slice; only
//! [`write_to_file`] touches the filesystem. Column and property layout
//! is part of the output contract:
//!
//! - CSV columns are `name,description,value,coordinates,type`, without
//!   the internal id. Coordinates are a quoted `lat lng` pair.
//! - GeoJSON features carry `[lng, lat]` point coordinates, the order
//!   that format mandates, with the record fields under `properties`.
//! - JSON is the record array pretty-printed as-is.

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::poi::{Category, PoiRecord};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    GeoJson,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::GeoJson => "geojson",
        }
    }

    /// File extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "geojson" => Ok(ExportFormat::GeoJson),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors from rendering or writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("no records to export")]
    NoData,

    #[error("failed to serialize records: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render records in the requested format.
pub fn render(records: &[PoiRecord], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => Ok(to_csv(records)),
        ExportFormat::Json => to_json(records),
        ExportFormat::GeoJson => to_geojson(records),
    }
}

/// Render records as CSV. Empty input renders as an empty string.
pub fn to_csv(records: &[PoiRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut lines = vec!["name,description,value,coordinates,type".to_string()];
    for record in records {
        lines.push(format!(
            "{},{},{},\"{} {}\",{}",
            escape_csv(&record.name),
            escape_csv(record.description.as_deref().unwrap_or("")),
            record.value,
            record.coordinates.lat,
            record.coordinates.lng,
            record.category,
        ));
    }
    lines.join("\n")
}

/// Render records as a pretty-printed JSON array.
pub fn to_json(records: &[PoiRecord]) -> Result<String, ExportError> {
    serde_json::to_string_pretty(records).map_err(|e| ExportError::Serialize(e.to_string()))
}

/// Render records as a GeoJSON `FeatureCollection` of points.
pub fn to_geojson(records: &[PoiRecord]) -> Result<String, ExportError> {
    let collection = FeatureCollection {
        kind: "FeatureCollection",
        features: records
            .iter()
            .map(|record| Feature {
                kind: "Feature",
                geometry: PointGeometry {
                    kind: "Point",
                    coordinates: [record.coordinates.lng, record.coordinates.lat],
                },
                properties: FeatureProperties {
                    id: &record.id,
                    name: &record.name,
                    description: record.description.as_deref().unwrap_or(""),
                    value: record.value,
                    category: record.category,
                },
            })
            .collect(),
    };
    serde_json::to_string_pretty(&collection).map_err(|e| ExportError::Serialize(e.to_string()))
}

/// Timestamped default file name, e.g. `poi-export-2024-06-01T12-30-05.csv`.
pub fn default_file_name(format: ExportFormat) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S");
    format!("poi-export-{}.{}", timestamp, format.extension())
}

/// Render and write records to `path`.
///
/// Refuses to write an empty export so a failed fetch cannot silently
/// truncate an existing file.
pub async fn write_to_file(
    records: &[PoiRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    if records.is_empty() {
        warn!(path = %path.display(), "refusing to export zero records");
        return Err(ExportError::NoData);
    }

    let content = render(records, format)?;
    tokio::fs::write(path, content).await?;
    info!(
        path = %path.display(),
        records = records.len(),
        format = %format,
        "exported records"
    );
    Ok(())
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: PointGeometry,
    properties: FeatureProperties<'a>,
}

#[derive(Serialize)]
struct PointGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

#[derive(Serialize)]
struct FeatureProperties<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    value: f64,
    #[serde(rename = "type")]
    category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::Coordinates;

    fn records() -> Vec<PoiRecord> {
        vec![
            PoiRecord {
                id: "osm-1".to_string(),
                name: "Cafe Simple".to_string(),
                description: Some("amenity: cafe".to_string()),
                value: 63.0,
                coordinates: Coordinates::new(48.85, 2.35),
                category: Category::Restaurant,
            },
            PoiRecord {
                id: "osm-2".to_string(),
                name: "Soup, Salad \"and\" More".to_string(),
                description: None,
                value: 70.5,
                coordinates: Coordinates::new(48.86, 2.36),
                category: Category::Restaurant,
            },
        ]
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv(&records());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name,description,value,coordinates,type");
        assert_eq!(
            lines[1],
            "Cafe Simple,amenity: cafe,63,\"48.85 2.35\",restaurant"
        );
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let csv = to_csv(&records());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[2],
            "\"Soup, Salad \"\"and\"\" More\",,70.5,\"48.86 2.36\",restaurant"
        );
    }

    #[test]
    fn test_csv_has_no_id_column() {
        let csv = to_csv(&records());
        assert!(!csv.contains("osm-1"));
        assert!(!csv.lines().next().unwrap().contains("id"));
    }

    #[test]
    fn test_csv_empty_input() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_json_round_trips() {
        let json = to_json(&records()).unwrap();
        let parsed: Vec<PoiRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let json = to_json(&records()).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("  {"));
    }

    #[test]
    fn test_geojson_structure() {
        let geojson = to_geojson(&records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&geojson).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let first = &features[0];
        assert_eq!(first["type"], "Feature");
        assert_eq!(first["geometry"]["type"], "Point");
        // GeoJSON point order is longitude first.
        assert_eq!(first["geometry"]["coordinates"][0], 2.35);
        assert_eq!(first["geometry"]["coordinates"][1], 48.85);
        assert_eq!(first["properties"]["id"], "osm-1");
        assert_eq!(first["properties"]["type"], "restaurant");
        assert_eq!(first["properties"]["value"], 63.0);
        // Missing descriptions render as empty strings.
        assert_eq!(features[1]["properties"]["description"], "");
    }

    #[test]
    fn test_format_parse_and_extension() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!(
            "GeoJson".parse::<ExportFormat>().unwrap(),
            ExportFormat::GeoJson
        );
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert_eq!(ExportFormat::GeoJson.extension(), "geojson");
    }

    #[test]
    fn test_default_file_name_shape() {
        let name = default_file_name(ExportFormat::Csv);
        assert!(name.starts_with("poi-export-"));
        assert!(name.ends_with(".csv"));
        // poi-export-YYYY-MM-DDTHH-MM-SS.csv
        assert_eq!(name.len(), "poi-export-2024-06-01T12-30-05.csv".len());
    }

    #[tokio::test]
    async fn test_write_to_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_to_file(&records(), ExportFormat::Json, &path)
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<PoiRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, records());
    }

    #[tokio::test]
    async fn test_write_refuses_empty_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let err = write_to_file(&[], ExportFormat::Csv, &path)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NoData));
        assert!(!path.exists());
    }
}
