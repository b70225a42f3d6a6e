//! Bounded exponential backoff for rate-limited backend calls.

use crate::error::SimulatorError;
use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tracing::{debug, warn};

/// Backoff policy applied to rate-limited backend requests.
///
/// The delay starts at [`initial_delay`](Self::initial_delay) and doubles per
/// retry; once the pre-retry delay would reach
/// [`max_delay`](Self::max_delay), the call fails permanently. The defaults
/// (1s initial, 8s cap) allow at most 3 retries, 4 attempts total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the pre-retry delay; reaching it fails the call.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    fn jitter_amount(&self) -> Duration {
        let bound = self.jitter.as_millis() as u64;
        if bound == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::random_range(0..bound))
        }
    }
}

/// Runs `op`, retrying with bounded exponential backoff as long as it fails
/// with a rate-limit error.
///
/// Any other error propagates immediately without retry. Backoff state is
/// local to this call.
pub async fn retry_rate_limited<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, SimulatorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SimulatorError>>,
{
    let mut delay = policy.initial_delay;
    let mut attempts = 0usize;

    loop {
        attempts += 1;
        match op().await {
            Err(err) if err.is_rate_limited() => {
                if delay >= policy.max_delay {
                    warn!(attempts, "backend kept rate limiting, giving up");
                    return Err(SimulatorError::RateLimited { attempts });
                }
                let sleep_for = delay + policy.jitter_amount();
                debug!(attempts, ?sleep_for, "rate limited, backing off");
                tokio::time::sleep(sleep_for).await;
                delay = delay.saturating_mul(2);
            }
            other => return other,
        }
    }
}
