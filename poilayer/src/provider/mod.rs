//! Upstream POI source abstraction.
//!
//! This module provides the trait seam between the fetch pipeline and
//! whatever actually produces raw elements. The real implementation is
//! [`OverpassSource`] over a [`ReqwestClient`]; tests substitute mocks at
//! either layer.

mod http;
mod overpass;
mod types;

pub use http::{BoxFuture, HttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS, USER_AGENT};
pub use overpass::{build_overpass_query, OverpassConfig, OverpassSource, DEFAULT_OVERPASS_URL};
pub use types::{ProviderError, RawElement};

use crate::query::BoundingBox;

/// Trait for POI data sources.
///
/// Dyn-compatible so the fetch service can hold `Arc<dyn PoiSource>` and
/// swap implementations at composition time.
pub trait PoiSource: Send + Sync {
    /// Short source name for logs.
    fn name(&self) -> &str;

    /// Fetch all raw elements inside the bounding box.
    fn fetch_raw(&self, bbox: BoundingBox) -> BoxFuture<'_, Result<Vec<RawElement>, ProviderError>>;
}

#[cfg(test)]
pub use http::tests::MockHttpClient;
