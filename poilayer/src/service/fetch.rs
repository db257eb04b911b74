//! The fetch pipeline.
//!
//! [`PoiService`] is the single entry point callers use to get POI data.
//! One call moves through the stages in a fixed order:
//!
//! 1. Reject invalid geometry outright.
//! 2. Look up the canonical query key in the cache.
//! 3. Join an identical in-flight fetch if one exists.
//! 4. Otherwise fetch upstream (throttled, with retries), normalize,
//!    filter, sort, slice, and cache the resulting page.
//!
//! The pipeline never surfaces an error: when the upstream is unusable
//! after the whole retry budget, callers get an empty result marked
//! [`FetchSource::Fallback`]. Failed fetches are never cached, so the
//! next call retries from scratch.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::ServiceConfig;
use crate::cache::{CacheStats, PoiCache};
use crate::poi::{normalize, transform, PoiRecord};
use crate::provider::PoiSource;
use crate::query::Query;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::throttle::RateThrottle;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Served from the result cache.
    Cache,
    /// Fetched from the upstream API on this call.
    Upstream,
    /// Degraded empty result after the upstream stayed unreachable.
    Fallback,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchSource::Cache => "cache",
            FetchSource::Upstream => "upstream",
            FetchSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of results plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// The records of the requested page.
    pub records: Vec<PoiRecord>,
    /// Size of the full filtered result set the page was sliced from.
    pub total_count: usize,
    pub source: FetchSource,
}

impl FetchResponse {
    fn fallback() -> Self {
        Self {
            records: Vec::new(),
            total_count: 0,
            source: FetchSource::Fallback,
        }
    }
}

type FlightReceiver = watch::Receiver<Option<FetchResponse>>;

enum Role {
    Leader(watch::Sender<Option<FetchResponse>>),
    Follower(FlightReceiver),
}

/// Removes the in-flight marker when the leader finishes, including on
/// unwind, so followers never wait on a fetch nobody is running.
struct FlightGuard<'a> {
    inflight: &'a DashMap<String, FlightReceiver>,
    key: &'a str,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

/// Cached, throttled, retrying POI fetcher.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct PoiService {
    cache: PoiCache,
    throttle: Arc<RateThrottle>,
    retry: RetryPolicy,
    source: Arc<dyn PoiSource>,
    inflight: DashMap<String, FlightReceiver>,
}

impl PoiService {
    /// Build a service with its own throttle.
    pub fn new(config: ServiceConfig, source: Arc<dyn PoiSource>) -> Self {
        let throttle = Arc::new(RateThrottle::new(config.throttle.clone()));
        Self::with_throttle(config, source, throttle)
    }

    /// Build a service sharing an existing throttle, so other clients of
    /// the same upstream infrastructure count against the same interval.
    pub fn with_throttle(
        config: ServiceConfig,
        source: Arc<dyn PoiSource>,
        throttle: Arc<RateThrottle>,
    ) -> Self {
        Self {
            cache: PoiCache::new(config.cache),
            throttle,
            retry: config.retry,
            source,
            inflight: DashMap::new(),
        }
    }

    /// Handle to the shared throttle.
    pub fn throttle(&self) -> Arc<RateThrottle> {
        Arc::clone(&self.throttle)
    }

    /// Fetch the page described by `query`.
    ///
    /// Identical concurrent calls are coalesced: one of them performs the
    /// upstream fetch and the rest share its outcome. This method does
    /// not fail; see [`FetchSource`] for how degraded results are marked.
    pub async fn fetch(&self, query: &Query) -> FetchResponse {
        if !query.is_valid() {
            warn!("rejecting query with invalid geometry");
            return FetchResponse::fallback();
        }

        let key = query.cache_key();
        loop {
            if let Some(page) = self.cache.get(&key) {
                debug!(key = %key, records = page.records.len(), "cache hit");
                return FetchResponse {
                    records: page.records,
                    total_count: page.total_count,
                    source: FetchSource::Cache,
                };
            }

            let role = match self.inflight.entry(key.clone()) {
                Entry::Occupied(entry) => Role::Follower(entry.get().clone()),
                Entry::Vacant(slot) => {
                    let (tx, rx) = watch::channel(None);
                    slot.insert(rx);
                    Role::Leader(tx)
                }
            };

            match role {
                Role::Leader(tx) => {
                    let _guard = FlightGuard {
                        inflight: &self.inflight,
                        key: &key,
                    };
                    let response = self.fetch_upstream(query, &key).await;
                    // Publish to any followers that attached meanwhile.
                    let _ = tx.send(Some(response.clone()));
                    return response;
                }
                Role::Follower(mut rx) => {
                    debug!(key = %key, "joining in-flight fetch for identical query");
                    loop {
                        let settled = rx.borrow().as_ref().cloned();
                        if let Some(response) = settled {
                            debug!(key = %key, source = %response.source, "shared in-flight result");
                            return response;
                        }
                        if rx.changed().await.is_err() {
                            // The leading task vanished without settling.
                            // Start over from the cache check.
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Fetch ignoring any pagination on the query: the full filtered and
    /// sorted result set.
    pub async fn fetch_all(&self, query: &Query) -> FetchResponse {
        self.fetch(&query.without_pagination()).await
    }

    /// Drop all cached pages.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn fetch_upstream(&self, query: &Query, key: &str) -> FetchResponse {
        let Some(bbox) = query.geometry.bounding_box() else {
            warn!(key = %key, "query geometry has no usable envelope");
            return FetchResponse::fallback();
        };

        let result = call_with_retry(&self.retry, &self.throttle, || {
            self.source.fetch_raw(bbox)
        })
        .await;

        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    key = %key,
                    source = self.source.name(),
                    error = %err,
                    "upstream fetch failed after all retries, returning empty result"
                );
                return FetchResponse::fallback();
            }
        };

        let mut records = normalize::normalize_elements(raw);
        if let Some(filters) = &query.filters {
            records = transform::apply_filters(records, filters);
        }
        let (page, total_count) = transform::paginate(records, query.pagination.as_ref());

        self.cache.put(key.to_string(), page.clone(), total_count);
        debug!(
            key = %key,
            records = page.len(),
            total = total_count,
            "fetched and cached upstream result"
        );

        FetchResponse {
            records: page,
            total_count,
            source: FetchSource::Upstream,
        }
    }
}
