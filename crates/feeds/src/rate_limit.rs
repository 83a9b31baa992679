//! Token bucket rate limiter for exchange polling.
//!
//! Time is read from `tokio::time`, so tests drive it with a paused clock.

use std::time::Duration;
use tokio::time::Instant;

/// Slowest rate accepted from configuration (about one token per 11.6 days).
pub const MIN_RATE: f64 = 1e-6;

/// Rate limit configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Tokens replenished per second (fractional allowed: 0.1 = one per 10s)
    pub per_second: f64,
    /// Bucket capacity
    pub burst: u32,
}

impl RateLimit {
    /// One token at a time at `per_second`.
    ///
    /// Panics if `per_second` is not finite and positive; configuration
    /// loading rejects such values first.
    pub fn per_second(per_second: f64) -> Self {
        assert!(
            per_second.is_finite() && per_second > 0.0,
            "rate must be finite and positive, got {per_second}"
        );
        Self {
            per_second,
            burst: 1,
        }
    }

    /// Time needed to replenish one token.
    pub fn interval(&self) -> Duration {
        seconds(1.0 / self.per_second)
    }
}

/// Token bucket limiter.
///
/// Starts full, so the first `burst` acquisitions return immediately.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimit,
    tokens: f64,
    last_update: Instant,
}

impl RateLimiter {
    pub fn new(config: RateLimit) -> Self {
        Self {
            tokens: config.burst as f64,
            last_update: Instant::now(),
            config,
        }
    }

    pub fn per_second(per_second: f64) -> Self {
        Self::new(RateLimit::per_second(per_second))
    }

    /// Replenish tokens based on elapsed time.
    fn replenish(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.config.per_second).min(self.config.burst as f64);
        self.last_update = now;
    }

    /// Try to take a token without waiting.
    pub fn try_acquire(&mut self) -> bool {
        self.replenish();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Get the time until a token becomes available.
    ///
    /// Returns `Duration::ZERO` if a token is available now.
    pub fn time_until_available(&mut self) -> Duration {
        self.replenish();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            seconds((1.0 - self.tokens) / self.config.per_second)
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&mut self) {
        loop {
            let wait = self.time_until_available();
            if wait.is_zero() && self.try_acquire() {
                return;
            }
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

}

/// Saturates instead of panicking when the wait overflows `Duration`.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
