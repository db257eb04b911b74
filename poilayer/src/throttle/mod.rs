//! Upstream call spacing.
//!
//! Public POI endpoints are shared infrastructure and reject clients that
//! hammer them. [`RateThrottle`] serializes call grants and guarantees a
//! minimum interval between consecutive grants, across every task and
//! every caller holding a clone of the same throttle.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::trace;

/// Default minimum spacing between upstream calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Throttle tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl ThrottleConfig {
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}

/// Shared gate in front of the upstream API.
///
/// `await_turn` resolves once the caller may fire its request. The grant
/// timestamp is taken while the internal lock is held, so two concurrent
/// callers can never be granted the same slot: the second one queues on
/// the lock and then waits out the remaining interval.
pub struct RateThrottle {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            min_interval: config.min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Wait until the minimum interval since the previous grant has
    /// passed, then record this call as the new grant.
    ///
    /// The first call ever resolves immediately. Waiters are served
    /// roughly in arrival order; the lock is held across the sleep so the
    /// spacing guarantee holds even under heavy task churn.
    pub async fn await_turn(&self) {
        let mut last_grant = self.last_grant.lock().await;
        if let Some(previous) = *last_grant {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "throttling upstream call");
                tokio::time::sleep(wait).await;
            }
        }
        *last_grant = Some(Instant::now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Timestamp of the most recent grant, if any.
    #[cfg(test)]
    pub(crate) async fn last_grant(&self) -> Option<Instant> {
        *self.last_grant.lock().await
    }
}
