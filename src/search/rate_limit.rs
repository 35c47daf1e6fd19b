//! Upstream Rate Limiter
//!
//! Enforces a minimum spacing between requests to a shared endpoint.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Default spacing: one request per second.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

// == Rate Limiter ==
/// Minimum-interval limiter shared by every caller of one upstream endpoint.
///
/// The last-request time is stamped when [`wait`](Self::wait) resolves, so
/// concurrent waiters are released strictly `min_interval` apart, in the
/// order they acquired the internal lock.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Resolves once at least `min_interval` has passed since the previous release.
    ///
    /// Cancel-safe: a waiter dropped while sleeping does not stamp the clock.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!(
                    delay_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "rate limiter delaying request"
                );
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
