//! Per-client admission control — token bucket.
//!
//! Each client identity gets a bucket with capacity `C` that refills at
//! `C` tokens per window (default 20 per 60 s). Refill is a deterministic
//! function of elapsed time, proportional and capped at capacity; request
//! volume never adds tokens. State is process-lifetime only — a restart
//! resets all buckets, which is the accepted trade-off.
//!
//! Locking mirrors the session store: an `RwLock` map for membership and
//! one `Mutex` per bucket, so one client's accounting never blocks
//! another's.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

/// Outcome of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Denied, with the seconds until a token would be available.
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

struct Bucket {
    /// Fractional tokens remaining; never negative.
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter keyed by opaque client identity.
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<Mutex<Bucket>>>>,
    capacity: f64,
    window: Duration,
}

impl RateLimiter {
    /// Limiter allowing `capacity` requests per `window` per client.
    pub fn new(capacity: u32, window: Duration) -> Self {
        RateLimiter {
            buckets: RwLock::new(HashMap::new()),
            capacity: f64::from(capacity.max(1)),
            window,
        }
    }

    /// Limiter with the conventional 60-second window.
    pub fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(60))
    }

    /// Check whether `client_id` may proceed at `now`.
    ///
    /// `now` is injected so callers own the clock; pass `Instant::now()`
    /// in production.
    pub fn admit(&self, client_id: &str, now: Instant) -> Admission {
        let bucket = self.bucket_for(client_id, now);
        let mut guard = bucket.lock().unwrap();

        // Proportional refill for the time elapsed since the last check,
        // capped at capacity.
        let elapsed = now.saturating_duration_since(guard.last_refill);
        let refill = elapsed.as_secs_f64() * self.rate_per_sec();
        guard.tokens = (guard.tokens + refill).min(self.capacity);
        guard.last_refill = now;

        if guard.tokens >= 1.0 {
            guard.tokens -= 1.0;
            Admission::Allowed
        } else {
            let needed = 1.0 - guard.tokens;
            let retry_after_secs = (needed / self.rate_per_sec()).ceil() as u64;
            debug!(client_id = %client_id, retry_after_secs, "admission denied");
            Admission::Denied { retry_after_secs }
        }
    }

    /// Drop buckets idle longer than `idle_for`. Housekeeping only —
    /// correctness does not depend on it (a recreated bucket starts full,
    /// which is what a long-idle client deserves anyway).
    pub fn evict_idle(&self, now: Instant, idle_for: Duration) -> usize {
        let mut map = self.buckets.write().unwrap();
        let before = map.len();
        map.retain(|_, bucket| {
            let guard = bucket.lock().unwrap();
            now.saturating_duration_since(guard.last_refill) < idle_for
        });
        before - map.len()
    }

    /// Number of tracked client identities.
    pub fn len(&self) -> usize {
        self.buckets.read().unwrap().len()
    }

    /// Whether no clients are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rate_per_sec(&self) -> f64 {
        self.capacity / self.window.as_secs_f64()
    }

    /// Fetch or lazily create the bucket for a client.
    fn bucket_for(&self, client_id: &str, now: Instant) -> Arc<Mutex<Bucket>> {
        {
            let map = self.buckets.read().unwrap();
            if let Some(bucket) = map.get(client_id) {
                return bucket.clone();
            }
        }

        let mut map = self.buckets.write().unwrap();
        map.entry(client_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Bucket {
                    tokens: self.capacity,
                    last_refill: now,
                }))
            })
            .clone()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_admits_then_denies() {
        let limiter = RateLimiter::per_minute(20);
        let now = Instant::now();

        for i in 0..20 {
            assert!(
                limiter.admit("10.0.0.1", now).is_allowed(),
                "request {i} should be admitted"
            );
        }
        assert!(!limiter.admit("10.0.0.1", now).is_allowed());
    }

    #[test]
    fn test_denial_carries_retry_hint() {
        let limiter = RateLimiter::per_minute(20);
        let now = Instant::now();
        for _ in 0..20 {
            limiter.admit("c", now);
        }

        match limiter.admit("c", now) {
            Admission::Denied { retry_after_secs } => {
                // One token regenerates every 3 seconds at 20/min.
                assert!(retry_after_secs >= 1 && retry_after_secs <= 3);
            }
            Admission::Allowed => panic!("expected denial"),
        }
    }

    #[test]
    fn test_full_window_restores_capacity() {
        let limiter = RateLimiter::per_minute(5);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.admit("c", now).is_allowed());
        }
        assert!(!limiter.admit("c", now).is_allowed());

        let later = now + Duration::from_secs(60);
        for _ in 0..5 {
            assert!(limiter.admit("c", later).is_allowed());
        }
        assert!(!limiter.admit("c", later).is_allowed());
    }

    #[test]
    fn test_partial_refill() {
        let limiter = RateLimiter::per_minute(20);
        let now = Instant::now();
        for _ in 0..20 {
            limiter.admit("c", now);
        }

        // 3 seconds at 20/min is exactly one token.
        let later = now + Duration::from_secs(3);
        assert!(limiter.admit("c", later).is_allowed());
        assert!(!limiter.admit("c", later).is_allowed());
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let limiter = RateLimiter::per_minute(5);
        let now = Instant::now();
        limiter.admit("c", now);

        // An hour idle must not bank more than capacity.
        let later = now + Duration::from_secs(3600);
        for _ in 0..5 {
            assert!(limiter.admit("c", later).is_allowed());
        }
        assert!(!limiter.admit("c", later).is_allowed());
    }

    #[test]
    fn test_clients_are_isolated() {
        let limiter = RateLimiter::per_minute(2);
        let now = Instant::now();

        assert!(limiter.admit("a", now).is_allowed());
        assert!(limiter.admit("a", now).is_allowed());
        assert!(!limiter.admit("a", now).is_allowed());

        // A different client is unaffected.
        assert!(limiter.admit("b", now).is_allowed());
    }

    #[test]
    fn test_denied_volume_does_not_refill() {
        let limiter = RateLimiter::per_minute(2);
        let now = Instant::now();
        limiter.admit("c", now);
        limiter.admit("c", now);

        // Hammering while denied never creates tokens.
        for _ in 0..100 {
            assert!(!limiter.admit("c", now).is_allowed());
        }
    }

    #[test]
    fn test_evict_idle_buckets() {
        let limiter = RateLimiter::per_minute(20);
        let now = Instant::now();
        limiter.admit("old", now);
        limiter.admit("recent", now + Duration::from_secs(500));

        let evicted = limiter.evict_idle(now + Duration::from_secs(600), Duration::from_secs(300));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_concurrent_admits_respect_capacity() {
        let limiter = Arc::new(RateLimiter::per_minute(100));
        let now = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    let mut allowed = 0usize;
                    for _ in 0..50 {
                        if limiter.admit("shared", now).is_allowed() {
                            allowed += 1;
                        }
                    }
                    allowed
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
    }
}
