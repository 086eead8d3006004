//! Outbound throttling for upstream marketplace APIs
//!
//! Uses a simple token bucket algorithm with in-memory storage.
//! One bucket per upstream host; tokens refill over time. A request that finds
//! its bucket empty is not sent at all. The number of tracked hosts is capped:
//! when a new host arrives at capacity, fully refilled buckets are dropped
//! first, then the least recently used one.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum tokens (burst capacity)
    pub max_tokens: u32,
    /// Tokens added per second
    pub refill_rate: f64,
    /// Hosts tracked at once
    pub max_hosts: usize,
}

impl Default for RateLimitConfig {
    /// Burst of 30 requests, sustained 2 requests/second per upstream
    fn default() -> Self {
        Self {
            max_tokens: 30,
            refill_rate: 2.0,
            max_hosts: 256,
        }
    }
}

struct HostBucket {
    tokens: f64,
    last_update: Instant,
}

/// Per-upstream rate limiter using token bucket algorithm
pub struct UpstreamRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, HostBucket>>,
}

impl UpstreamRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Check if a request to `host` may go out now.
    /// Returns true if allowed, false if throttled.
    pub fn check(&self, host: &str) -> bool {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        if !buckets.contains_key(host) && buckets.len() >= self.config.max_hosts.max(1) {
            self.evict(&mut buckets, now);
        }

        let bucket = buckets
            .entry(host.to_string())
            .or_insert_with(|| HostBucket {
                tokens: self.config.max_tokens as f64,
                last_update: now,
            });

        bucket.tokens = self.refilled(bucket, now);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remove buckets that haven't been touched within `max_age`
    pub fn cleanup(&self, max_age: Duration) {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    }

    /// Tokens `bucket` holds at `now`, refill included
    fn refilled(&self, bucket: &HostBucket, now: Instant) -> f64 {
        let elapsed = now.duration_since(bucket.last_update);
        let refill = elapsed.as_secs_f64() * self.config.refill_rate;
        (bucket.tokens + refill).min(self.config.max_tokens as f64)
    }

    fn evict(&self, buckets: &mut HashMap<String, HostBucket>, now: Instant) {
        // A full bucket is indistinguishable from a fresh one
        let max = self.config.max_tokens as f64;
        buckets.retain(|_, bucket| self.refilled(bucket, now) < max);

        if buckets.len() >= self.config.max_hosts.max(1) {
            let oldest = buckets
                .iter()
                .min_by_key(|(_, bucket)| bucket.last_update)
                .map(|(host, _)| host.clone());
            if let Some(host) = oldest {
                buckets.remove(&host);
            }
        }
    }

    #[cfg(test)]
    fn tracked_hosts(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for UpstreamRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
