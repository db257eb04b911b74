//! Fetch service composition.
//!
//! This module wires the cache, throttle, retry policy, and upstream
//! source into one [`PoiService`]. Construction is plain dependency
//! injection: callers build the parts, hand them over, and the service
//! owns the fetch pipeline from then on.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use poilayer::provider::{OverpassConfig, OverpassSource, ReqwestClient};
//! use poilayer::query::{BoundingBox, Geometry, Query};
//! use poilayer::service::{PoiService, ServiceConfig};
//!
//! let http = ReqwestClient::new()?;
//! let source = OverpassSource::new(OverpassConfig::default(), http);
//! let service = PoiService::new(ServiceConfig::default(), Arc::new(source));
//!
//! let query = Query::new(Geometry::Bounds(BoundingBox::new(48.9, 2.4, 48.8, 2.3)));
//! let response = service.fetch(&query).await;
//! ```

mod config;
mod fetch;

pub use config::ServiceConfig;
pub use fetch::{FetchResponse, FetchSource, PoiService};
