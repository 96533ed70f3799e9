//! Rate Limiting with Token Bucket Algorithm
//!
//! - Tokens are added to the bucket at a steady rate
//! - Each admitted call consumes one token
//! - The bucket holds at most `burst` tokens
//! - A call arriving at an empty bucket is rejected, never queued
//!
//! The limiter sits in front of the job pool and is independent of its
//! capacity: it bounds arrival rate, the pool bounds concurrency.

use crate::config::RateLimitConfig;
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by all calls of a service
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A full bucket refilling at `per_second`
    pub fn new(per_second: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            per_second: per_second.max(0.0),
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Limiter for the configuration, or `None` when disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.per_second, config.burst))
    }

    /// Take a token if one is available
    pub fn try_acquire(&self) -> bool {
        let mut bucket = match self.bucket.lock() {
            Ok(bucket) => bucket,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            tracing::trace!(target: "service::rate_limit", tokens = bucket.tokens, "rejected");
            false
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.per_second).min(self.burst);
        bucket.last_refill = now;
    }
}
