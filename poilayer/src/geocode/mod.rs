//! Place-name search via the Nominatim API.
//!
//! Turns a free-text query like "Eiffel Tower" into candidate places with
//! coordinates and bounding boxes, ready to seed a POI query. Nominatim
//! is the same shared OpenStreetMap infrastructure as the POI endpoint,
//! so the client takes its turn at the same [`RateThrottle`] and keeps a
//! small TTL cache of recent searches.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::provider::{HttpClient, ProviderError};
use crate::query::BoundingBox;
use crate::throttle::RateThrottle;

/// Default public Nominatim endpoint.
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Default maximum number of places per search.
pub const DEFAULT_RESULT_LIMIT: u32 = 10;

/// Default size of the search result cache.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100;

/// Default lifetime of a cached search.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Geocoding client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeConfig {
    pub endpoint: String,
    pub limit: u32,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODE_URL.to_string(),
            limit: DEFAULT_RESULT_LIMIT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl GeocodeConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Errors surfaced by a search.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to parse geocoding response: {0}")]
    Parse(String),
}

/// One candidate place.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    /// Relevance score from the upstream ranker, higher is better.
    pub importance: Option<f64>,
    pub bounding_box: Option<BoundingBox>,
}

/// Raw Nominatim row. Coordinates arrive as strings and the bounding box
/// as `[south, north, west, east]` strings.
#[derive(Debug, Deserialize)]
struct NominatimRow {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    boundingbox: Option<[String; 4]>,
}

impl NominatimRow {
    fn into_place(self) -> Option<Place> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lng = self.lon.parse::<f64>().ok()?;
        let bounding_box = self.boundingbox.and_then(|bb| {
            let south = bb[0].parse::<f64>().ok()?;
            let north = bb[1].parse::<f64>().ok()?;
            let west = bb[2].parse::<f64>().ok()?;
            let east = bb[3].parse::<f64>().ok()?;
            Some(BoundingBox::new(north, east, south, west))
        });
        Some(Place {
            display_name: self.display_name,
            lat,
            lng,
            importance: self.importance,
            bounding_box,
        })
    }
}

/// Throttled, caching Nominatim client.
pub struct GeocodeClient {
    config: GeocodeConfig,
    http_client: Arc<dyn HttpClient>,
    throttle: Arc<RateThrottle>,
    cache: Cache<String, Arc<Vec<Place>>>,
}

impl GeocodeClient {
    pub fn new(
        config: GeocodeConfig,
        http_client: Arc<dyn HttpClient>,
        throttle: Arc<RateThrottle>,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();
        Self {
            config,
            http_client,
            throttle,
            cache,
        }
    }

    /// Search for places matching `query`, best matches first.
    ///
    /// A blank query returns no places without touching the network.
    /// Rows the upstream returns in an unparsable shape are skipped, not
    /// fatal.
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = trimmed.to_lowercase();
        if let Some(hit) = self.cache.get(&cache_key).await {
            debug!(query = %trimmed, "geocode cache hit");
            return Ok(hit.as_ref().clone());
        }

        self.throttle.await_turn().await;
        let url = self.build_url(trimmed)?;
        let body = self.http_client.get(&url).await?;
        let rows: Vec<NominatimRow> =
            serde_json::from_slice(&body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let total = rows.len();
        let mut places: Vec<Place> = rows.into_iter().filter_map(NominatimRow::into_place).collect();
        if places.len() < total {
            debug!(
                kept = places.len(),
                dropped = total - places.len(),
                "skipped unparsable geocode rows"
            );
        }
        places.sort_by(|a, b| {
            b.importance
                .unwrap_or(0.0)
                .total_cmp(&a.importance.unwrap_or(0.0))
        });

        self.cache
            .insert(cache_key, Arc::new(places.clone()))
            .await;
        Ok(places)
    }

    fn build_url(&self, query: &str) -> Result<String, ProviderError> {
        let limit = self.config.limit.to_string();
        let url = reqwest::Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("format", "json"),
                ("q", query),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }
}
