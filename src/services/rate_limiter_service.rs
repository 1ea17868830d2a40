// ============================================================================
// RATE LIMITING SERVICE - Per-tenant admission control
// ============================================================================
//
// Fixed-window counters, one window per tenant, created lazily on first
// check and reset in place when the window elapses. A burst straddling a
// window boundary can admit up to twice the configured maximum in a short
// span; that is an accepted property of the reset-on-expiry scheme and
// callers should size limits with it in mind.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::context::TenantId;

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    // tenant -> independently guarded window; decisions for different
    // tenants never serialize behind one lock
    windows: DashMap<TenantId, Arc<Mutex<Window>>>,
    max_requests: u32,
    window_length: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_length: Duration) -> Self {
        info!(
            "Initializing rate limiter ({} requests per {:?} window)",
            max_requests, window_length
        );
        Self {
            windows: DashMap::new(),
            max_requests,
            window_length,
        }
    }

    /// Admission check for one request by `tenant`.
    ///
    /// Returns `true` and counts the request while the tenant's live window
    /// has headroom, `true` with a fresh window once the previous one has
    /// fully elapsed, and `false` without counting when the live window is
    /// at the maximum.
    pub fn allow(&self, tenant: &TenantId) -> bool {
        self.allow_at(tenant, Instant::now())
    }

    fn allow_at(&self, tenant: &TenantId, now: Instant) -> bool {
        let slot = self.window_slot(tenant, now);
        let mut window = slot.lock();
        if now.duration_since(window.started_at) >= self.window_length {
            window.started_at = now;
            window.count = 1;
            return true;
        }
        if window.count < self.max_requests {
            window.count += 1;
            true
        } else {
            warn!(tenant = %tenant, max_requests = self.max_requests, "Rate limit exceeded");
            false
        }
    }

    /// Requests left in the tenant's live window. A tenant with no window
    /// yet, or an elapsed one, has the full budget.
    pub fn remaining(&self, tenant: &TenantId) -> u32 {
        match self.windows.get(tenant) {
            Some(slot) => {
                let window = slot.lock();
                if window.started_at.elapsed() >= self.window_length {
                    self.max_requests
                } else {
                    self.max_requests.saturating_sub(window.count)
                }
            }
            None => self.max_requests,
        }
    }

    /// Drop the tenant's window so its next request starts a fresh one.
    pub fn reset(&self, tenant: &TenantId) {
        if self.windows.remove(tenant).is_some() {
            debug!(tenant = %tenant, "rate limit window reset");
        }
    }

    fn window_slot(&self, tenant: &TenantId, now: Instant) -> Arc<Mutex<Window>> {
        // entry() briefly locks the map shard for get-or-create; the
        // admission decision itself runs under the window's own mutex
        self.windows
            .entry(tenant.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Window {
                    started_at: now,
                    count: 0,
                }))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tenant(name: &str) -> TenantId {
        TenantId::new(name).unwrap()
    }

    #[test]
    fn test_window_admits_up_to_max_then_denies() {
        let limiter = RateLimiter::new(2, Duration::from_millis(60_000));
        let t1 = tenant("t1");
        let t0 = Instant::now();

        assert!(limiter.allow_at(&t1, t0));
        assert!(limiter.allow_at(&t1, t0 + Duration::from_millis(10)));
        assert!(!limiter.allow_at(&t1, t0 + Duration::from_millis(20)));

        // a denied request is not counted
        assert_eq!(limiter.remaining(&t1), 0);
    }

    #[test]
    fn test_elapsed_window_restarts_with_count_one() {
        let limiter = RateLimiter::new(2, Duration::from_millis(60_000));
        let t1 = tenant("t1");
        let t0 = Instant::now();

        assert!(limiter.allow_at(&t1, t0));
        assert!(limiter.allow_at(&t1, t0));
        assert!(!limiter.allow_at(&t1, t0));

        // at exactly window length the window resets
        let later = t0 + Duration::from_millis(61_000);
        assert!(limiter.allow_at(&t1, later));
        // fresh window started with count 1, one more fits
        assert!(limiter.allow_at(&t1, later));
        assert!(!limiter.allow_at(&t1, later));
    }

    #[test]
    fn test_tenants_are_isolated() {
        let limiter = RateLimiter::new(1, Duration::from_millis(60_000));
        let a = tenant("tenant-a");
        let b = tenant("tenant-b");
        let t0 = Instant::now();

        assert!(limiter.allow_at(&a, t0));
        assert!(!limiter.allow_at(&a, t0));
        // a's exhausted window does not affect b at the same instant
        assert!(limiter.allow_at(&b, t0));
    }

    #[test]
    fn test_sleep_based_window_reset() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        let t1 = tenant("t1");

        assert!(limiter.allow(&t1));
        assert!(!limiter.allow(&t1));

        thread::sleep(Duration::from_millis(80));
        assert!(limiter.allow(&t1));
    }

    #[test]
    fn test_remaining_and_reset() {
        let limiter = RateLimiter::new(3, Duration::from_millis(60_000));
        let t1 = tenant("t1");

        assert_eq!(limiter.remaining(&t1), 3);
        limiter.allow(&t1);
        limiter.allow(&t1);
        assert_eq!(limiter.remaining(&t1), 1);

        limiter.reset(&t1);
        assert_eq!(limiter.remaining(&t1), 3);
        assert!(limiter.allow(&t1));
    }

    #[test]
    fn test_concurrent_tenants_admit_exactly_max_each() {
        let limiter = Arc::new(RateLimiter::new(20, Duration::from_millis(60_000)));
        let mut handles = Vec::new();

        for name in ["tenant-a", "tenant-b"] {
            for _ in 0..4 {
                let limiter = limiter.clone();
                let t = tenant(name);
                handles.push(thread::spawn(move || {
                    let mut admitted = 0u32;
                    for _ in 0..10 {
                        if limiter.allow(&t) {
                            admitted += 1;
                        }
                    }
                    (t, admitted)
                }));
            }
        }

        let mut totals: std::collections::HashMap<TenantId, u32> = std::collections::HashMap::new();
        for handle in handles {
            let (t, admitted) = handle.join().unwrap();
            *totals.entry(t).or_insert(0) += admitted;
        }

        // 40 attempts per tenant against a budget of 20
        assert_eq!(totals[&tenant("tenant-a")], 20);
        assert_eq!(totals[&tenant("tenant-b")], 20);
    }
}
