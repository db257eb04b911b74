//! Bounded in-memory result cache.

mod store;

pub use store::{
    CacheConfig, CacheStats, CachedPage, PoiCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL,
};
