//! Overpass API data source.
//!
//! Overpass is the public query endpoint for OpenStreetMap data. Requests
//! are HTTP GETs with a QL program in the `data` query parameter:
//!
//! ```text
//! https://overpass-api.de/api/interpreter?data=[out:json];(...);out body;
//! ```
//!
//! The QL program selects one `node[...]` clause per tag of interest,
//! bounded by the query's `(south,west,north,east)` box, and asks for
//! JSON output. The selector table mirrors the categories recognized
//! during normalization.

use serde::Deserialize;
use tracing::debug;

use super::http::{BoxFuture, HttpClient};
use super::types::{ProviderError, RawElement};
use super::PoiSource;
use crate::query::BoundingBox;

/// Default public Overpass endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Tags worth fetching. `None` matches any value of the key.
const TAG_SELECTORS: &[(&str, Option<&str>)] = &[
    // Food and drink
    ("amenity", Some("restaurant")),
    ("amenity", Some("cafe")),
    ("amenity", Some("fast_food")),
    ("amenity", Some("bar")),
    ("amenity", Some("pub")),
    ("amenity", Some("food_court")),
    // Health
    ("amenity", Some("hospital")),
    ("amenity", Some("clinic")),
    ("amenity", Some("doctors")),
    ("amenity", Some("dentist")),
    ("amenity", Some("pharmacy")),
    ("healthcare", None),
    // Education
    ("amenity", Some("school")),
    ("amenity", Some("university")),
    ("amenity", Some("college")),
    ("amenity", Some("kindergarten")),
    ("amenity", Some("library")),
    // Leisure
    ("leisure", Some("park")),
    ("leisure", Some("garden")),
    ("leisure", Some("playground")),
    ("leisure", Some("sports_centre")),
    ("leisure", Some("stadium")),
    ("leisure", Some("pitch")),
    // Retail
    ("shop", None),
    // Transport
    ("public_transport", None),
    ("amenity", Some("bus_station")),
    ("amenity", Some("taxi")),
    ("railway", Some("station")),
    ("highway", Some("bus_stop")),
    // Public services
    ("amenity", Some("police")),
    ("amenity", Some("fire_station")),
    ("amenity", Some("post_office")),
    ("amenity", Some("townhall")),
    ("office", Some("government")),
    // Tourism
    ("tourism", None),
    ("historic", None),
    // Money
    ("amenity", Some("bank")),
    ("amenity", Some("atm")),
    // Worship
    ("amenity", Some("place_of_worship")),
];

/// Overpass endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassConfig {
    pub endpoint: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OVERPASS_URL.to_string(),
        }
    }
}

impl OverpassConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Top-level Overpass JSON response.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

/// POI source backed by the Overpass API.
pub struct OverpassSource<C: HttpClient> {
    config: OverpassConfig,
    http_client: C,
}

impl<C: HttpClient> OverpassSource<C> {
    pub fn new(config: OverpassConfig, http_client: C) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Builds the request URL for the given bounding box.
    fn build_url(&self, bbox: &BoundingBox) -> Result<String, ProviderError> {
        let query = build_overpass_query(bbox);
        let url = reqwest::Url::parse_with_params(&self.config.endpoint, &[("data", query)])
            .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }
}

/// Assemble the QL program selecting every tag of interest inside `bbox`.
pub fn build_overpass_query(bbox: &BoundingBox) -> String {
    let bounds = format!("{},{},{},{}", bbox.south, bbox.west, bbox.north, bbox.east);
    let mut query = String::from("[out:json];(");
    for (key, value) in TAG_SELECTORS {
        match value {
            Some(value) => {
                query.push_str(&format!("node[\"{}\"=\"{}\"]({});", key, value, bounds))
            }
            None => query.push_str(&format!("node[\"{}\"]({});", key, bounds)),
        }
    }
    query.push_str(");out body;");
    query
}

impl<C: HttpClient> PoiSource for OverpassSource<C> {
    fn name(&self) -> &str {
        "overpass"
    }

    fn fetch_raw(&self, bbox: BoundingBox) -> BoxFuture<'_, Result<Vec<RawElement>, ProviderError>> {
        Box::pin(async move {
            let url = self.build_url(&bbox)?;
            debug!(endpoint = %self.config.endpoint, "requesting elements");
            let body = self.http_client.get(&url).await?;
            let response: OverpassResponse = serde_json::from_slice(&body)
                .map_err(|e| ProviderError::Parse(e.to_string()))?;
            debug!(elements = response.elements.len(), "parsed upstream response");
            Ok(response.elements)
        })
    }
}
