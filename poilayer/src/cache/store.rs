//! Keyed result store with TTL expiry and bounded capacity.
//!
//! The store holds one result page per canonical query key. Its behavior
//! is deliberately deterministic:
//!
//! - Entries older than the TTL are expired lazily: every read first
//!   sweeps all expired entries, so no background task is needed and a
//!   stale page is never returned.
//! - When an insert pushes the store past capacity, the entries with the
//!   oldest creation time are removed first. Reads do not refresh an
//!   entry's age; only re-insertion does.
//!
//! All operations take a single short-lived lock. No I/O or awaiting
//! happens under it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::poi::PoiRecord;

/// Default maximum number of cached result pages.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries before the oldest are evicted.
    pub max_entries: usize,
    /// How long an entry stays valid after insertion.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently stored, including any not yet swept.
    pub size: usize,
    pub max_size: usize,
    pub ttl: Duration,
}

/// One cached result page: the records of that page plus the size of the
/// full result set they were sliced from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub records: Vec<PoiRecord>,
    pub total_count: usize,
}

struct Entry {
    records: Vec<PoiRecord>,
    total_count: usize,
    created_at: Instant,
    /// Tie-breaker for entries created within the same clock tick, so
    /// eviction order stays insertion order.
    seq: u64,
}

struct Inner {
    map: HashMap<String, Entry>,
    next_seq: u64,
}

/// Bounded TTL cache for query result pages.
pub struct PoiCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    ttl: Duration,
}

impl PoiCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                next_seq: 0,
            }),
            max_entries: config.max_entries,
            ttl: config.ttl,
        }
    }

    /// Look up a page, sweeping expired entries first.
    pub fn get(&self, key: &str) -> Option<CachedPage> {
        let mut inner = self.inner.lock();
        self.sweep_expired(&mut inner);
        inner.map.get(key).map(|entry| CachedPage {
            records: entry.records.clone(),
            total_count: entry.total_count,
        })
    }

    /// Insert a page, evicting the oldest entries if capacity is exceeded.
    /// Re-inserting an existing key replaces the entry and resets its age.
    pub fn put(&self, key: String, records: Vec<PoiRecord>, total_count: usize) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.map.insert(
            key,
            Entry {
                records,
                total_count,
                created_at: Instant::now(),
                seq,
            },
        );

        while inner.map.len() > self.max_entries {
            let oldest = inner
                .map
                .iter()
                .min_by_key(|(_, entry)| (entry.created_at, entry.seq))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    inner.map.remove(&key);
                    debug!(key = %key, "evicted oldest cache entry");
                }
                None => break,
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().map.clear();
    }

    /// Current counters. Read-only: expired entries are not swept here
    /// and still count toward `size` until the next read.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.inner.lock().map.len(),
            max_size: self.max_entries,
            ttl: self.ttl,
        }
    }

    fn sweep_expired(&self, inner: &mut Inner) {
        let now = Instant::now();
        let before = inner.map.len();
        inner
            .map
            .retain(|_, entry| now.duration_since(entry.created_at) <= self.ttl);
        let swept = before - inner.map.len();
        if swept > 0 {
            debug!(swept, "swept expired cache entries");
        }
    }
}

impl Default for PoiCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::{Category, Coordinates};

    fn page(id: &str) -> Vec<PoiRecord> {
        vec![PoiRecord {
            id: id.to_string(),
            name: format!("Place {id}"),
            description: None,
            value: 61.0,
            coordinates: Coordinates::new(48.85, 2.35),
            category: Category::Restaurant,
        }]
    }

    fn small_cache(max_entries: usize) -> PoiCache {
        PoiCache::new(
            CacheConfig::default()
                .with_max_entries(max_entries)
                .with_ttl(Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_put_and_get() {
        let cache = small_cache(10);
        cache.put("a".to_string(), page("osm-1"), 7);

        let hit = cache.get("a").unwrap();
        assert_eq!(hit.records, page("osm-1"));
        assert_eq!(hit.total_count, 7);
    }

    #[test]
    fn test_miss_returns_none() {
        let cache = small_cache(10);
        assert_eq!(cache.get("absent"), None);
    }

    #[test]
    fn test_reinsert_replaces_payload() {
        let cache = small_cache(10);
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("a".to_string(), page("osm-2"), 2);

        assert_eq!(cache.stats().size, 1);
        let hit = cache.get("a").unwrap();
        assert_eq!(hit.records[0].id, "osm-2");
        assert_eq!(hit.total_count, 2);
    }

    #[test]
    fn test_expired_entry_is_gone_and_swept() {
        let cache = PoiCache::new(
            CacheConfig::default()
                .with_max_entries(10)
                .with_ttl(Duration::from_millis(20)),
        );
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("b".to_string(), page("osm-2"), 1);
        assert!(cache.get("a").is_some());

        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get("a"), None);
        // The read swept every expired entry, not just the requested one.
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_oldest_entry_evicted_first() {
        let cache = small_cache(3);
        cache.put("first".to_string(), page("osm-1"), 1);
        cache.put("second".to_string(), page("osm-2"), 1);
        cache.put("third".to_string(), page("osm-3"), 1);
        cache.put("fourth".to_string(), page("osm-4"), 1);

        assert_eq!(cache.stats().size, 3);
        assert_eq!(cache.get("first"), None);
        assert!(cache.get("second").is_some());
        assert!(cache.get("fourth").is_some());
    }

    #[test]
    fn test_reinsert_resets_eviction_age() {
        let cache = small_cache(2);
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("b".to_string(), page("osm-2"), 1);
        // Re-inserting "a" makes it the youngest, so "b" goes next.
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("c".to_string(), page("osm-3"), 1);

        assert!(cache.get("a").is_some());
        assert_eq!(cache.get("b"), None);
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_reads_do_not_refresh_age() {
        let cache = small_cache(2);
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("b".to_string(), page("osm-2"), 1);
        // Reading "a" must not protect it from eviction.
        assert!(cache.get("a").is_some());
        cache.put("c".to_string(), page("osm-3"), 1);

        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = small_cache(10);
        cache.put("a".to_string(), page("osm-1"), 1);
        cache.put("b".to_string(), page("osm-2"), 1);
        cache.clear();

        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_stats_reports_configuration() {
        let cache = PoiCache::new(
            CacheConfig::default()
                .with_max_entries(5)
                .with_ttl(Duration::from_secs(120)),
        );
        cache.put("a".to_string(), page("osm-1"), 1);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 5);
        assert_eq!(stats.ttl, Duration::from_secs(120));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = small_cache(5);
        for i in 0..100 {
            cache.put(format!("key-{i}"), page(&format!("osm-{i}")), 1);
            assert!(cache.stats().size <= 5, "overflow at insert {i}");
        }
    }

    #[test]
    fn test_mixed_random_operations_hold_capacity() {
        use rand::Rng;

        let cache = small_cache(8);
        let mut rng = rand::rng();
        for _ in 0..500 {
            let key = format!("key-{}", rng.random_range(0..32));
            if rng.random_range(0..3) == 0 {
                let _ = cache.get(&key);
            } else {
                cache.put(key, page("osm-1"), 1);
            }
            assert!(cache.stats().size <= 8);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_capacity_invariant(keys in proptest::collection::vec(0u16..64, 1..200), max in 1usize..16) {
                let cache = PoiCache::new(
                    CacheConfig::default()
                        .with_max_entries(max)
                        .with_ttl(Duration::from_secs(60)),
                );
                for key in keys {
                    cache.put(format!("key-{key}"), page("osm-1"), 1);
                    prop_assert!(cache.stats().size <= max);
                }
            }

            #[test]
            fn prop_last_insert_always_resident(keys in proptest::collection::vec(0u16..64, 1..100)) {
                let cache = PoiCache::new(
                    CacheConfig::default()
                        .with_max_entries(4)
                        .with_ttl(Duration::from_secs(60)),
                );
                for key in &keys {
                    cache.put(format!("key-{key}"), page("osm-1"), 1);
                }
                let last = format!("key-{}", keys[keys.len() - 1]);
                prop_assert!(cache.get(&last).is_some());
            }
        }
    }
}
