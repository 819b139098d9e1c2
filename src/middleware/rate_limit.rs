//! In-memory fixed-window rate limiter.
//!
//! Tracks one counting window per principal (an API key id, or whatever
//! identity string the gateway picks). State is process-local: it is not
//! persisted and is not coordinated across instances. Entries are rebuilt
//! lazily on the first request of a new window and reclaimed periodically
//! by a sweeper task so the map stays bounded.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Length of the counting window.
const WINDOW_SECONDS: i64 = 60;

/// How often the sweeper reclaims expired entries.
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// The quota the check was made against
    pub limit: i32,

    /// Requests left in the current window (never negative)
    pub remaining: i32,

    /// When the current window ends and the counter resets
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window resets, rounded up, never negative.
    ///
    /// Returned to denied callers as `retryAfter`.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0);
        (millis as u64).div_ceil(1000) as i64
    }
}

/// Per-principal counter for the current window.
#[derive(Debug)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Shared fixed-window counter table.
///
/// Owned by the application state and handed to the auth gateway by
/// injection; there is no module-level singleton. All increments for the
/// same principal are serialized by the table mutex, so concurrent
/// requests on one key cannot lose counts.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Create a limiter with the standard 60-second window.
    pub fn new() -> Self {
        Self {
            window: Duration::seconds(WINDOW_SECONDS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request for `principal` against `quota`.
    ///
    /// The first request for a principal, or the first after its stored
    /// window has elapsed, starts a fresh window with count = 1. Every
    /// call increments the counter, including calls that end up denied:
    /// a flood of rejected retries must not reset effective throughput.
    pub fn check(&self, principal: &str, quota: i32) -> RateLimitDecision {
        self.check_at(principal, quota, Utc::now())
    }

    /// Clock-injected variant of [`check`](Self::check).
    fn check_at(&self, principal: &str, quota: i32, now: DateTime<Utc>) -> RateLimitDecision {
        let mut entries = self.entries.lock().expect("rate limit table poisoned");

        let entry = entries
            .entry(principal.to_string())
            .and_modify(|entry| {
                if entry.reset_at <= now {
                    entry.count = 0;
                    entry.reset_at = now + self.window;
                }
            })
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_at: now + self.window,
            });

        entry.count += 1;

        RateLimitDecision {
            allowed: entry.count <= quota.max(0) as u32,
            limit: quota,
            remaining: (quota - entry.count as i32).max(0),
            reset_at: entry.reset_at,
        }
    }

    /// Drop entries whose window has already elapsed.
    ///
    /// Correctness never depends on this running: `check` restarts elapsed
    /// windows on its own. The sweep only bounds memory for principals
    /// that stopped sending requests.
    pub fn sweep(&self) {
        self.sweep_at(Utc::now());
    }

    fn sweep_at(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("rate limit table poisoned");
        entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Number of principals currently tracked.
    pub fn tracked_principals(&self) -> usize {
        self.entries
            .lock()
            .expect("rate limit table poisoned")
            .len()
    }

    /// Spawn the periodic sweeper for this limiter.
    ///
    /// Runs until the process exits; each pass only holds the table mutex
    /// for the retain itself, so request handling is never blocked for
    /// long.
    pub fn start_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                limiter.sweep();
                tracing::debug!(
                    principals = limiter.tracked_principals(),
                    "rate limit sweep complete"
                );
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_quota_then_denies() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for i in 1..=2 {
            let decision = limiter.check_at("api_key:a", 2, now);
            assert!(decision.allowed, "request {i} should pass");
        }

        let third = limiter.check_at("api_key:a", 2, now);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert!(third.retry_after_secs(now) > 0);
    }

    #[test]
    fn denied_requests_still_count() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        limiter.check_at("api_key:a", 1, now);
        let denied = limiter.check_at("api_key:a", 1, now);
        assert!(!denied.allowed);

        // The denial consumed a slot: the entry sits at count=2, so the
        // retry budget does not refill until the window actually resets.
        let still_denied = limiter.check_at("api_key:a", 1, now);
        assert!(!still_denied.allowed);
        assert_eq!(still_denied.reset_at, denied.reset_at);
    }

    #[test]
    fn fresh_window_after_reset() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        let first = limiter.check_at("api_key:a", 2, now);
        limiter.check_at("api_key:a", 2, now);
        assert!(!limiter.check_at("api_key:a", 2, now).allowed);

        let later = first.reset_at + Duration::seconds(1);
        let fresh = limiter.check_at("api_key:a", 2, later);
        assert!(fresh.allowed);
        // Fresh window starts at count=1
        assert_eq!(fresh.remaining, 1);
        assert!(fresh.reset_at > first.reset_at);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        for _ in 0..5 {
            let decision = limiter.check_at("api_key:a", 2, now);
            assert!(decision.remaining >= 0);
        }
        assert_eq!(limiter.check_at("api_key:a", 2, now).remaining, 0);
    }

    #[test]
    fn principals_are_isolated() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        limiter.check_at("api_key:a", 1, now);
        assert!(!limiter.check_at("api_key:a", 1, now).allowed);
        assert!(limiter.check_at("api_key:b", 1, now).allowed);
    }

    #[test]
    fn sweep_reclaims_only_expired_entries() {
        let limiter = RateLimiter::new();
        let now = Utc::now();

        limiter.check_at("api_key:stale", 10, now - Duration::seconds(120));
        limiter.check_at("api_key:live", 10, now);
        assert_eq!(limiter.tracked_principals(), 2);

        limiter.sweep_at(now);
        assert_eq!(limiter.tracked_principals(), 1);

        // The surviving window is untouched
        let decision = limiter.check_at("api_key:live", 10, now);
        assert_eq!(decision.remaining, 8);
    }

    #[test]
    fn retry_after_rounds_up_and_clamps_at_zero() {
        let now = Utc::now();
        let decision = RateLimitDecision {
            allowed: false,
            limit: 1,
            remaining: 0,
            reset_at: now + Duration::milliseconds(1500),
        };
        assert_eq!(decision.retry_after_secs(now), 2);

        let past = RateLimitDecision {
            reset_at: now - Duration::seconds(5),
            ..decision
        };
        assert_eq!(past.retry_after_secs(now), 0);
    }

    #[tokio::test]
    async fn concurrent_checks_lose_no_increments() {
        let limiter = Arc::new(RateLimiter::new());
        let quota = 50;

        let mut handles = vec![];
        for _ in 0..quota + 10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.check("api_key:a", quota)
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().allowed {
                allowed += 1;
            }
        }

        // Exactly `quota` checks pass even under contention
        assert_eq!(allowed, quota);
    }
}
