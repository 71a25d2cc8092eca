//! Per-token rate limiting for the moderation endpoint
//!
//! Token bucket per bearer token, kept in memory. Buckets refill
//! continuously at `refill_rate` up to `max_tokens`.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Burst capacity
    pub max_tokens: u32,
    /// Tokens added per second
    pub refill_rate: f64,
}

struct Bucket {
    tokens: f64,
    last_update: Instant,
}

pub struct TokenRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one request from the key's bucket. Returns false when exhausted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let capacity = f64::from(self.config.max_tokens);

        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: capacity,
            last_update: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_update);
        let refill = elapsed.as_secs_f64() * self.config.refill_rate;
        bucket.tokens = (bucket.tokens + refill).min(capacity);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Forget buckets idle longer than `max_age`
    pub fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    }

    /// Drop a key's bucket, e.g. after its token is deleted
    pub fn forget(&self, key: &str) {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }
}
