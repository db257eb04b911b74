//! Wire types and errors shared by the provider implementations.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from upstream data sources.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection, TLS, request build).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Upstream answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request URL could not be constructed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The response body was not in the expected shape.
    #[error("failed to parse upstream response: {0}")]
    Parse(String),
}

/// One raw element as returned by the upstream API.
///
/// Coordinates are optional because some element kinds carry none; such
/// elements are dropped during normalization rather than failing the
/// whole response. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_element_tolerates_missing_fields() {
        let element: RawElement =
            serde_json::from_str(r#"{"type":"way","id":7,"nodes":[1,2,3]}"#).unwrap();
        assert_eq!(element.id, 7);
        assert_eq!(element.lat, None);
        assert_eq!(element.lon, None);
        assert!(element.tags.is_empty());
    }

    #[test]
    fn test_raw_element_parses_node() {
        let element: RawElement = serde_json::from_str(
            r#"{"type":"node","id":123,"lat":48.85,"lon":2.35,"tags":{"amenity":"cafe","name":"Le Test"}}"#,
        )
        .unwrap();
        assert_eq!(element.lat, Some(48.85));
        assert_eq!(element.tags.get("amenity").map(String::as_str), Some("cafe"));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Status {
            status: 504,
            url: "https://overpass-api.de/api/interpreter".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 504 from https://overpass-api.de/api/interpreter"
        );
    }
}
