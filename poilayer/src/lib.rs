//! PoiLayer - cached, throttled point-of-interest fetching for map tools.
//!
//! This library sits between a map frontend and the public OpenStreetMap
//! query APIs. It turns geospatial queries into normalized POI records
//! while shielding the upstream from repeat and burst traffic.
//!
//! # Architecture
//!
//! A fetch flows through four cooperating parts:
//!
//! - [`query`] - geometry, filters, pagination, and the canonical cache
//!   key derived from them
//! - [`cache`] - bounded TTL store holding one result page per key
//! - [`throttle`] / [`retry`] - minimum spacing between upstream calls
//!   and a bounded retry budget with exponential backoff
//! - [`service`] - the [`PoiService`](service::PoiService) pipeline that
//!   wires them together over a [`provider`] source
//!
//! [`geocode`] adds place-name search over the same throttle, and
//! [`export`] renders results as CSV, JSON, or GeoJSON.

pub mod cache;
pub mod config;
pub mod export;
pub mod geocode;
pub mod logging;
pub mod poi;
pub mod provider;
pub mod query;
pub mod retry;
pub mod service;
pub mod throttle;

pub use poi::PoiRecord;
pub use query::Query;
pub use service::{FetchResponse, FetchSource, PoiService, ServiceConfig};

/// Crate version, as baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
