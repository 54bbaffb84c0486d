use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument};

/// Minimum-interval rate limiter for NCBI API compliance
///
/// NCBI E-utilities rate limits:
/// - 3 requests per second without API key
/// - 10 requests per second with API key
/// - Violations can result in IP blocking
///
/// Clones share the same state, so one limiter throttles every task of a
/// batch, not each chemical separately.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<LimiterState>>,
    min_interval: Duration,
    rate: f64,
}

struct LimiterState {
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified rate
    ///
    /// # Arguments
    ///
    /// * `calls_per_second` - Maximum requests per second (e.g., 3.0 for NCBI without API key)
    ///
    /// Non-positive or non-finite rates fall back to one call per second.
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::rate_limit::RateLimiter;
    ///
    /// // NCBI rate limit without API key
    /// let limiter = RateLimiter::new(3.0);
    ///
    /// // NCBI rate limit with API key
    /// let limiter_with_key = RateLimiter::new(10.0);
    /// ```
    pub fn new(calls_per_second: f64) -> Self {
        let rate = if calls_per_second.is_finite() && calls_per_second > 0.0 {
            calls_per_second
        } else {
            1.0
        };
        Self {
            state: Arc::new(Mutex::new(LimiterState { last_call: None })),
            min_interval: Duration::from_secs_f64(1.0 / rate),
            rate,
        }
    }

    /// Create rate limiter for NCBI API without API key (3 requests/second)
    pub fn ncbi_default() -> Self {
        Self::new(3.0)
    }

    /// Create rate limiter for NCBI API with API key (10 requests/second)
    pub fn ncbi_with_key() -> Self {
        Self::new(10.0)
    }

    /// Wait until the next call is allowed
    ///
    /// The lock is held across the sleep, so concurrent callers queue up and
    /// leave one interval apart.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chemscreen::rate_limit::RateLimiter;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let limiter = RateLimiter::ncbi_default();
    ///
    ///     limiter.wait().await;
    ///     // Make API call here
    ///
    ///     limiter.wait().await;
    ///     // Make another API call here
    /// }
    /// ```
    #[instrument(skip(self))]
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        if let Some(last_call) = state.last_call {
            let next_allowed = last_call + self.min_interval;
            if next_allowed > Instant::now() {
                debug!(
                    wait_duration_ms = (next_allowed - Instant::now()).as_millis(),
                    "Sleeping to respect rate limit"
                );
                sleep_until(next_allowed).await;
            }
        }

        state.last_call = Some(Instant::now());
    }

    /// Get the configured rate limit (requests per second)
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Minimum spacing between two calls
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
