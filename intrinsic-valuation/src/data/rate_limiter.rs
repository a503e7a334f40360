//! Token bucket rate limiter for upstream requests.
//!
//! Alpha Vantage enforces per-minute quotas and answers with a "Note" body
//! instead of an error status when they are exceeded, so requests are
//! throttled before they leave the process.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket refilled continuously at `requests_per_minute / 60` per second.
///
/// Burst capacity is one second's worth of requests (at least one).
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    capacity: f64,
    tokens_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` (minimum 1).
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        let capacity = (f64::from(rpm) / 60.0).ceil().max(1.0);

        Self {
            name: name.into(),
            capacity,
            tokens_per_sec: f64::from(rpm) / 60.0,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.tokens_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }

    /// Take a token, or report how long until one is available.
    async fn take(&self) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            Err(Duration::from_secs_f64(missing / self.tokens_per_sec))
        }
    }

    /// Acquire a token, waiting if necessary.
    pub async fn acquire(&self) {
        while let Err(wait) = self.take().await {
            let wait = wait.max(Duration::from_millis(10));
            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, waiting for token"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Burst capacity in requests.
    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }
}

/// Shared rate limiter that can be cloned.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Create a shared rate limiter.
pub fn shared_limiter(name: impl Into<String>, requests_per_minute: u32) -> SharedRateLimiter {
    let limiter = RateLimiter::new(name, requests_per_minute);
    debug!(
        limiter = %limiter.name,
        rpm = requests_per_minute,
        burst = limiter.capacity(),
        "Rate limiter created"
    );
    Arc::new(limiter)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(RateLimiter::new("test", 300).capacity(), 5);
        assert_eq!(RateLimiter::new("test", 75).capacity(), 2);
        assert_eq!(RateLimiter::new("test", 5).capacity(), 1);
        assert_eq!(RateLimiter::new("test", 0).capacity(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_exhausts_bucket() {
        let limiter = RateLimiter::new("test", 60);
        assert!(limiter.take().await.is_ok());
        assert!(!limiter.take().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new("test", 60);
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(900));
        assert!(waited <= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped() {
        let limiter = RateLimiter::new("test", 120);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(limiter.take().await.is_ok());
        assert!(limiter.take().await.is_ok());
        assert!(!limiter.take().await.is_ok());
    }
}
