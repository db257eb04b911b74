//! Integration tests for the fetch pipeline.
//!
//! These tests verify the complete flow over the public API:
//! - Query -> cache lookup -> throttled, retried source call
//! - Normalization, filtering, sorting, and pagination
//! - Cache population, expiry, and capacity behavior
//!
//! Run with: `cargo test --test fetch_pipeline_integration`

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use poilayer::cache::CacheConfig;
use poilayer::poi::Category;
use poilayer::provider::{BoxFuture, PoiSource, ProviderError, RawElement};
use poilayer::query::{
    BoundingBox, FilterOptions, Geometry, Pagination, Query, SortKey, SortOrder,
};
use poilayer::retry::RetryPolicy;
use poilayer::service::{FetchSource, PoiService, ServiceConfig};
use poilayer::throttle::ThrottleConfig;

// ============================================================================
// Helper Functions
// ============================================================================

/// POI source replaying a fixed element set, optionally failing the first
/// few calls to exercise the retry path.
struct ScriptedSource {
    elements: Vec<RawElement>,
    fail_first: usize,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(elements: Vec<RawElement>) -> Arc<Self> {
        Self::failing_first(elements, 0)
    }

    fn failing_first(elements: Vec<RawElement>, fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            elements,
            fail_first,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoiSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_raw(
        &self,
        _bbox: BoundingBox,
    ) -> BoxFuture<'_, Result<Vec<RawElement>, ProviderError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let result = if call <= self.fail_first {
            Err(ProviderError::Http(format!("scripted failure {call}")))
        } else {
            Ok(self.elements.clone())
        };
        Box::pin(async move { result })
    }
}

/// Create a node element with the given tags.
fn make_node(id: i64, lat: f64, lng: f64, tags: &[(&str, &str)]) -> RawElement {
    RawElement {
        id,
        lat: Some(lat),
        lon: Some(lng),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<String, String>>(),
    }
}

/// A Paris-area element mix: restaurants, a school, a shop, and one
/// element without coordinates.
fn paris_elements() -> Vec<RawElement> {
    vec![
        make_node(1, 48.851, 2.31, &[("amenity", "restaurant"), ("name", "Chez Un")]),
        make_node(12, 48.852, 2.32, &[("amenity", "cafe"), ("name", "Deux Cafe")]),
        make_node(23, 48.853, 2.33, &[("amenity", "fast_food"), ("name", "Trois Vite")]),
        make_node(34, 48.854, 2.34, &[("amenity", "school"), ("name", "Ecole")]),
        make_node(45, 48.855, 2.35, &[("shop", "bakery"), ("name", "Pain Quotidien")]),
        RawElement {
            id: 99,
            lat: None,
            lon: None,
            tags: BTreeMap::new(),
        },
    ]
}

fn paris_query() -> Query {
    Query::new(Geometry::Bounds(BoundingBox::new(48.90, 2.40, 48.80, 2.30)))
}

/// Service config with millisecond-scale timing so tests stay fast.
fn quick_config() -> ServiceConfig {
    ServiceConfig::default()
        .with_throttle(ThrottleConfig::default().with_min_interval(Duration::from_millis(1)))
        .with_retry(
            RetryPolicy::default()
                .with_base_delay(Duration::from_millis(1))
                .with_timeout(Duration::from_millis(500)),
        )
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_filtered_sorted_page_end_to_end() {
    let source = ScriptedSource::new(paris_elements());
    let service = PoiService::new(quick_config(), source.clone());

    let query = paris_query()
        .with_filters(FilterOptions {
            category: Some(Category::Restaurant),
            sort_by: Some(SortKey::Value),
            sort_order: Some(SortOrder::Descending),
            ..Default::default()
        })
        .with_pagination(Pagination::new(1, 10));

    let response = service.fetch(&query).await;

    assert_eq!(response.source, FetchSource::Upstream);
    assert!(response.records.len() <= 10);
    assert_eq!(response.total_count, 3);
    assert!(response
        .records
        .iter()
        .all(|r| r.category == Category::Restaurant));
    assert!(response
        .records
        .windows(2)
        .all(|pair| pair[0].value >= pair[1].value));
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_repeat_query_is_served_from_cache() {
    let source = ScriptedSource::new(paris_elements());
    let service = PoiService::new(quick_config(), source.clone());
    let query = paris_query();

    let first = service.fetch(&query).await;
    let second = service.fetch(&query).await;

    assert_eq!(first.source, FetchSource::Upstream);
    assert_eq!(second.source, FetchSource::Cache);
    assert_eq!(second.records, first.records);
    assert_eq!(second.total_count, first.total_count);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried_to_success() {
    // Two failures fit inside the default budget of three attempts.
    let source = ScriptedSource::failing_first(paris_elements(), 2);
    let service = PoiService::new(quick_config(), source.clone());

    let response = service.fetch(&paris_query()).await;

    assert_eq!(response.source, FetchSource::Upstream);
    assert_eq!(response.total_count, 5);
    assert_eq!(source.call_count(), 3);
}

#[tokio::test]
async fn test_persistent_failure_degrades_to_empty_fallback() {
    let source = ScriptedSource::failing_first(paris_elements(), usize::MAX);
    let service = PoiService::new(quick_config(), source.clone());

    let response = service.fetch(&paris_query()).await;

    assert_eq!(response.source, FetchSource::Fallback);
    assert!(response.records.is_empty());
    assert_eq!(response.total_count, 0);
    assert_eq!(source.call_count(), 3);
    // Nothing was cached, so the caller can try again later.
    assert_eq!(service.cache_stats().size, 0);
}

#[tokio::test]
async fn test_distinct_queries_respect_throttle_spacing() {
    let source = ScriptedSource::new(paris_elements());
    let config = quick_config()
        .with_throttle(ThrottleConfig::default().with_min_interval(Duration::from_millis(50)));
    let service = PoiService::new(config, source.clone());

    let other = Query::new(Geometry::Bounds(BoundingBox::new(52.6, 13.5, 52.4, 13.3)));

    let started = Instant::now();
    service.fetch(&paris_query()).await;
    service.fetch(&other).await;

    assert_eq!(source.call_count(), 2);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_cache_capacity_bounds_distinct_queries() {
    let source = ScriptedSource::new(paris_elements());
    let config = quick_config().with_cache(
        CacheConfig::default()
            .with_max_entries(2)
            .with_ttl(Duration::from_secs(60)),
    );
    let service = PoiService::new(config, source.clone());

    for limit in 1..=4 {
        let query = paris_query().with_pagination(Pagination::new(1, limit));
        service.fetch(&query).await;
    }

    assert_eq!(source.call_count(), 4);
    assert_eq!(service.cache_stats().size, 2);

    // Only the most recent pages survived.
    let newest = paris_query().with_pagination(Pagination::new(1, 4));
    assert_eq!(service.fetch(&newest).await.source, FetchSource::Cache);
    let oldest = paris_query().with_pagination(Pagination::new(1, 1));
    assert_eq!(service.fetch(&oldest).await.source, FetchSource::Upstream);
}

#[tokio::test]
async fn test_expired_entry_triggers_refetch() {
    let source = ScriptedSource::new(paris_elements());
    let config = quick_config().with_cache(
        CacheConfig::default()
            .with_max_entries(10)
            .with_ttl(Duration::from_millis(30)),
    );
    let service = PoiService::new(config, source.clone());
    let query = paris_query();

    service.fetch(&query).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let after_expiry = service.fetch(&query).await;

    assert_eq!(after_expiry.source, FetchSource::Upstream);
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_identical_queries_share_one_call() {
    let source = ScriptedSource::new(paris_elements());
    let service = Arc::new(PoiService::new(quick_config(), source.clone()));
    let query = paris_query();

    let responses =
        futures::future::join_all((0..8).map(|_| service.fetch(&query))).await;

    assert_eq!(source.call_count(), 1);
    assert!(responses.iter().all(|r| r.total_count == 5));
}
