//! Sliding-window per-client-IP rate limiting (§4.9.1).

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// `windowStart`/`count` per IP, reset once the window elapses. Cheap to
/// clone: the map lives behind an `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
    max_requests: u32,
    window: Duration,
}

pub enum Decision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub async fn check(&self, ip: IpAddr) -> Decision {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let entry = windows.entry(ip).or_insert_with(|| Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            let elapsed = now.duration_since(entry.started_at);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Decision::Limited { retry_after_secs };
        }

        Decision::Allowed
    }

    /// Drops windows that elapsed at least one window ago. Intended to run
    /// on a fixed interval so the map doesn't grow unbounded with one-shot
    /// clients.
    pub async fn sweep(&self) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        let window = self.window;
        windows.retain(|_, w| w.started_at.elapsed() < window * 2);
        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip() -> IpAddr {
        "203.0.113.1".parse().unwrap()
    }

    #[tokio::test]
    async fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
        }
    }

    #[tokio::test]
    async fn rejects_the_request_past_the_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
        assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
        match limiter.check(ip()).await {
            Decision::Limited { retry_after_secs } => assert!(retry_after_secs > 0),
            Decision::Allowed => panic!("expected the third request to be limited"),
        }
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
    }

    #[tokio::test]
    async fn different_ips_have_independent_windows() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(matches!(limiter.check(ip()).await, Decision::Allowed));
        let other: IpAddr = "203.0.113.2".parse().unwrap();
        assert!(matches!(limiter.check(other).await, Decision::Allowed));
    }
}
