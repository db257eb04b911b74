//! Aggregate configuration for the fetch service.

use crate::cache::CacheConfig;
use crate::config::ConfigFile;
use crate::retry::RetryPolicy;
use crate::throttle::ThrottleConfig;

/// Everything [`PoiService`](super::PoiService) needs to tune its parts.
///
/// The defaults match the documented behavior: 50 cached pages for five
/// minutes, one second between upstream calls, two retries with a
/// 20-second per-attempt deadline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub throttle: ThrottleConfig,
    pub retry: RetryPolicy,
}

impl ServiceConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build from a loaded configuration file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        Self {
            cache: CacheConfig::default()
                .with_max_entries(file.cache.max_entries)
                .with_ttl(std::time::Duration::from_secs(file.cache.ttl_secs)),
            throttle: ThrottleConfig::default().with_min_interval(
                std::time::Duration::from_millis(file.throttle.min_interval_ms),
            ),
            retry: RetryPolicy::default()
                .with_max_retries(file.retry.max_retries)
                .with_base_delay(std::time::Duration::from_millis(file.retry.base_delay_ms))
                .with_timeout(std::time::Duration::from_secs(file.retry.timeout_secs)),
        }
    }
}
