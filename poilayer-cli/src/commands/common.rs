//! Shared argument types and construction helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use poilayer::config::ConfigFile;
use poilayer::geocode::{GeocodeClient, GeocodeConfig};
use poilayer::poi::Category;
use poilayer::provider::{
    OverpassConfig, OverpassSource, ReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS,
};
use poilayer::query::{
    BoundingBox, FilterOptions, Geometry, Query, SortKey, SortOrder,
};
use poilayer::service::{PoiService, ServiceConfig};
use poilayer::throttle::{RateThrottle, ThrottleConfig};

use crate::error::CliError;

/// Region flags shared by `fetch` and `export`. Exactly one of `--bbox`,
/// `--center`, or `--polygon` must be given.
#[derive(Debug, clap::Args)]
pub struct GeometryArgs {
    /// Bounding box as north,east,south,west degrees
    #[arg(long, value_name = "N,E,S,W")]
    pub bbox: Option<String>,

    /// Circle center as lat,lng degrees (requires --radius)
    #[arg(long, value_name = "LAT,LNG", requires = "radius")]
    pub center: Option<String>,

    /// Circle radius in meters
    #[arg(long, value_name = "METERS", requires = "center")]
    pub radius: Option<f64>,

    /// Polygon vertices as lat,lng pairs separated by semicolons
    #[arg(long, value_name = "LAT,LNG;LAT,LNG;...")]
    pub polygon: Option<String>,
}

impl GeometryArgs {
    /// Build the query geometry, rejecting missing or conflicting flags.
    pub fn to_geometry(&self) -> Result<Geometry, CliError> {
        match (&self.bbox, &self.center, &self.polygon) {
            (Some(bbox), None, None) => Ok(Geometry::Bounds(parse_bbox(bbox)?)),
            (None, Some(center), None) => {
                let (lat, lng) = parse_lat_lng(center)?;
                // clap enforces the pairing of --center and --radius.
                let radius_m = self.radius.ok_or_else(|| {
                    CliError::Usage("--center requires --radius".to_string())
                })?;
                if radius_m <= 0.0 {
                    return Err(CliError::Usage(format!(
                        "--radius must be positive, got {}",
                        radius_m
                    )));
                }
                Ok(Geometry::Center { lat, lng, radius_m })
            }
            (None, None, Some(polygon)) => Ok(Geometry::Polygon(parse_polygon(polygon)?)),
            (None, None, None) => Err(CliError::Usage(
                "specify a region with --bbox, --center/--radius, or --polygon".to_string(),
            )),
            _ => Err(CliError::Usage(
                "--bbox, --center, and --polygon are mutually exclusive".to_string(),
            )),
        }
    }
}

/// Sortable field, CLI spelling.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Id,
    Name,
    Description,
    Value,
    Type,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Id => SortKey::Id,
            SortField::Name => SortKey::Name,
            SortField::Description => SortKey::Description,
            SortField::Value => SortKey::Value,
            SortField::Type => SortKey::Category,
        }
    }
}

/// Sort direction, CLI spelling.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for SortOrder {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => SortOrder::Ascending,
            SortDirection::Desc => SortOrder::Descending,
        }
    }
}

/// Result filter flags shared by `fetch` and `export`.
#[derive(Debug, clap::Args)]
pub struct FilterArgs {
    /// Keep only records of this category (e.g. restaurant, hospital)
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<Category>,

    /// Keep only records with at least this value
    #[arg(long, value_name = "VALUE")]
    pub min_value: Option<f64>,

    /// Keep only records with at most this value
    #[arg(long, value_name = "VALUE")]
    pub max_value: Option<f64>,

    /// Sort records by this field
    #[arg(long, value_enum, value_name = "FIELD")]
    pub sort_by: Option<SortField>,

    /// Sort direction
    #[arg(long, value_enum, value_name = "DIR")]
    pub sort_order: Option<SortDirection>,
}

impl FilterArgs {
    /// Collect into filter options, `None` when no flag was given.
    pub fn to_filters(&self) -> Option<FilterOptions> {
        let filters = FilterOptions {
            category: self.category,
            min_value: self.min_value,
            max_value: self.max_value,
            sort_by: self.sort_by.map(SortKey::from),
            sort_order: self.sort_order.map(SortOrder::from),
        };
        (!filters.is_empty()).then_some(filters)
    }
}

/// Build an unpaginated query from geometry and filter flags.
pub fn build_query(geometry: &GeometryArgs, filters: &FilterArgs) -> Result<Query, CliError> {
    let mut query = Query::new(geometry.to_geometry()?);
    if let Some(filters) = filters.to_filters() {
        query = query.with_filters(filters);
    }
    Ok(query)
}

/// Load configuration: an explicit path must exist and parse; otherwise
/// the default location is tried, falling back to built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load(path)?),
        None => Ok(ConfigFile::load_default()?),
    }
}

/// Assemble the POI fetch service over the real Overpass source.
pub fn build_service(config: &ConfigFile) -> Result<PoiService, CliError> {
    let http = build_http_client(config)?;
    let source = OverpassSource::new(
        OverpassConfig::default().with_endpoint(config.upstream.endpoint.clone()),
        http,
    );
    Ok(PoiService::new(
        ServiceConfig::from_config_file(config),
        Arc::new(source),
    ))
}

/// Assemble the geocoding client with its own throttle instance.
///
/// Each CLI invocation is a fresh process, so the search command never
/// competes with a POI fetch for the same interval.
pub fn build_geocoder(config: &ConfigFile) -> Result<GeocodeClient, CliError> {
    let http = build_http_client(config)?;
    let throttle = Arc::new(RateThrottle::new(ThrottleConfig::default().with_min_interval(
        Duration::from_millis(config.throttle.min_interval_ms),
    )));
    let geocode_config = GeocodeConfig::default()
        .with_endpoint(config.geocode.endpoint.clone())
        .with_limit(config.geocode.limit);
    Ok(GeocodeClient::new(geocode_config, Arc::new(http), throttle))
}

fn build_http_client(config: &ConfigFile) -> Result<ReqwestClient, CliError> {
    ReqwestClient::with_options(DEFAULT_HTTP_TIMEOUT_SECS, &config.upstream.user_agent)
        .map_err(|e| CliError::Config(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn parse_bbox(s: &str) -> Result<BoundingBox, CliError> {
    let parts = parse_floats(s, 4, "--bbox expects north,east,south,west")?;
    Ok(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}

pub(crate) fn parse_lat_lng(s: &str) -> Result<(f64, f64), CliError> {
    let parts = parse_floats(s, 2, "--center expects lat,lng")?;
    Ok((parts[0], parts[1]))
}

pub(crate) fn parse_polygon(s: &str) -> Result<Vec<(f64, f64)>, CliError> {
    s.split(';')
        .map(|pair| {
            let parts =
                parse_floats(pair, 2, "--polygon expects lat,lng pairs separated by ';'")?;
            Ok((parts[0], parts[1]))
        })
        .collect()
}

fn parse_floats(s: &str, count: usize, usage: &str) -> Result<Vec<f64>, CliError> {
    let parts: Result<Vec<f64>, _> = s.split(',').map(|p| p.trim().parse::<f64>()).collect();
    match parts {
        Ok(values) if values.len() == count => Ok(values),
        _ => Err(CliError::Usage(format!("{}, got '{}'", usage, s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_geometry() -> GeometryArgs {
        GeometryArgs {
            bbox: None,
            center: None,
            radius: None,
            polygon: None,
        }
    }

    fn no_filters() -> FilterArgs {
        FilterArgs {
            category: None,
            min_value: None,
            max_value: None,
            sort_by: None,
            sort_order: None,
        }
    }

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("48.9, 2.4, 48.8, 2.3").unwrap();
        assert_eq!(bbox, BoundingBox::new(48.9, 2.4, 48.8, 2.3));

        assert!(matches!(parse_bbox("48.9,2.4,48.8"), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_bbox("north,east,south,west"),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_parse_polygon() {
        let points = parse_polygon("48.8,2.3; 48.9,2.4 ;48.85,2.5").unwrap();
        assert_eq!(points, vec![(48.8, 2.3), (48.9, 2.4), (48.85, 2.5)]);

        assert!(matches!(parse_polygon("48.8,2.3;"), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_geometry_requires_exactly_one_region() {
        let err = no_geometry().to_geometry().unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));

        let both = GeometryArgs {
            bbox: Some("1,1,0,0".to_string()),
            polygon: Some("0,0;1,1".to_string()),
            ..no_geometry()
        };
        assert!(matches!(both.to_geometry(), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_center_geometry_rejects_nonpositive_radius() {
        let args = GeometryArgs {
            center: Some("48.85,2.35".to_string()),
            radius: Some(0.0),
            ..no_geometry()
        };
        assert!(matches!(args.to_geometry(), Err(CliError::Usage(_))));

        let args = GeometryArgs {
            center: Some("48.85,2.35".to_string()),
            radius: Some(500.0),
            ..no_geometry()
        };
        assert_eq!(
            args.to_geometry().unwrap(),
            Geometry::Center {
                lat: 48.85,
                lng: 2.35,
                radius_m: 500.0
            }
        );
    }

    #[test]
    fn test_empty_filters_collapse_to_none() {
        assert_eq!(no_filters().to_filters(), None);

        let args = FilterArgs {
            category: Some(Category::Restaurant),
            sort_by: Some(SortField::Value),
            sort_order: Some(SortDirection::Desc),
            ..no_filters()
        };
        let filters = args.to_filters().unwrap();
        assert_eq!(filters.category, Some(Category::Restaurant));
        assert_eq!(filters.sort_by, Some(SortKey::Value));
        assert_eq!(filters.sort_order, Some(SortOrder::Descending));
    }

    #[test]
    fn test_build_query_combines_geometry_and_filters() {
        let geometry = GeometryArgs {
            bbox: Some("48.9,2.4,48.8,2.3".to_string()),
            ..no_geometry()
        };
        let filters = FilterArgs {
            min_value: Some(50.0),
            ..no_filters()
        };

        let query = build_query(&geometry, &filters).unwrap();
        assert!(query.is_valid());
        assert_eq!(query.filters.unwrap().min_value, Some(50.0));
        assert_eq!(query.pagination, None);
    }
}
