//! Retry with per-attempt timeout and exponential backoff.
//!
//! [`call_with_retry`] drives a fallible async operation: every attempt
//! first takes its turn at the shared [`RateThrottle`], then runs under a
//! deadline. Failed or timed-out attempts back off exponentially before
//! the next try. When the attempt budget is exhausted the last failure is
//! returned; callers decide what degraded result to surface.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::throttle::RateThrottle;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default backoff unit. Attempt `n` failing waits `base * 2^n`.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Retry tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. Zero means try exactly once.
    pub max_retries: u32,
    /// Unit of the exponential backoff.
    pub base_delay: Duration,
    /// Deadline applied to every individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backoff before retry number `attempt + 1`, where `attempt` counts
    /// the failures so far starting at 1. With the default one-second
    /// base this yields 2s, 4s, 8s, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Why a retried operation ultimately failed.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error,
{
    /// The final attempt exceeded the per-attempt deadline.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    /// The final attempt failed with the underlying error.
    #[error(transparent)]
    Upstream(E),
}

/// Run `operation` until it succeeds or the retry budget is spent.
///
/// Every attempt, including the first, waits for its throttle turn, so
/// the upstream call spacing holds across retries as well as across
/// concurrent callers. Timeouts count as failed attempts.
///
/// # Arguments
///
/// * `policy` - Attempt budget, backoff unit, and per-attempt deadline.
/// * `throttle` - Shared gate taken before each attempt.
/// * `operation` - Produces a fresh future per attempt.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    throttle: &RateThrottle,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total_attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 1u32;
    loop {
        throttle.await_turn().await;

        let failure = match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!(attempt, "attempt succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Err(err)) => {
                warn!(attempt, total_attempts, error = %err, "attempt failed");
                RetryError::Upstream(err)
            }
            Err(_) => {
                warn!(
                    attempt,
                    total_attempts,
                    timeout_ms = policy.timeout.as_millis() as u64,
                    "attempt timed out"
                );
                RetryError::Timeout(policy.timeout)
            }
        };

        if attempt >= total_attempts {
            return Err(failure);
        }

        let delay = policy.backoff_delay(attempt);
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "backing off before retry"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
