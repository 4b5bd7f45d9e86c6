//! Credential endpoint throttling.
//!
//! Fixed window per client IP. Login and registration are the only routes
//! behind it; bcrypt makes each of those requests expensive.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    pub window: Duration,
    /// Extra requests tolerated before rejecting
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
            burst: 5,
        }
    }
}

impl RateLimitConfig {
    fn ceiling(&self) -> u32 {
        self.max_requests.saturating_add(self.burst)
    }
}

struct Window {
    hits: u32,
    opened: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a hit. Err carries the time until the window reopens.
    pub fn check(&self, ip: IpAddr) -> Result<u32, Duration> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<u32, Duration> {
        let mut windows = self.windows.lock();
        let window = windows.entry(ip).or_insert(Window {
            hits: 0,
            opened: now,
        });

        if now.saturating_duration_since(window.opened) >= self.config.window {
            window.hits = 0;
            window.opened = now;
        }

        window.hits = window.hits.saturating_add(1);

        let ceiling = self.config.ceiling();
        if window.hits > ceiling {
            let reopens = window.opened + self.config.window;
            Err(reopens.saturating_duration_since(now))
        } else {
            Ok(ceiling - window.hits)
        }
    }

    /// Drop windows idle for more than two periods
    pub fn cleanup(&self) {
        let now = Instant::now();
        let stale_after = self.config.window * 2;
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.opened) < stale_after);
        let dropped = before - windows.len();
        if dropped > 0 {
            debug!("🧹 Rate limiter dropped {} idle clients", dropped);
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }

    /// Background sweep; runs until the runtime shuts down
    pub fn spawn_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        let period = self.config.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.cleanup();
            }
        })
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(ip) {
        Ok(_) => next.run(request).await,
        Err(retry_after) => {
            let secs = retry_after.as_secs().max(1);
            warn!(ip = %ip, retry_after_secs = secs, "Credential rate limit exceeded");

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(json!({
                    "error": "rate_limited",
                    "message": "Too many requests. Please slow down.",
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, burst: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            burst,
        })
    }

    #[test]
    fn test_allows_up_to_limit_plus_burst() {
        let limiter = limiter(5, 3);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let now = Instant::now();

        for expected_remaining in (0..8).rev() {
            assert_eq!(limiter.check_at(ip, now), Ok(expected_remaining));
        }
        assert!(limiter.check_at(ip, now).is_err());
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 0);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        let now = Instant::now();

        assert!(limiter.check_at(a, now).is_ok());
        assert!(limiter.check_at(a, now).is_err());
        assert!(limiter.check_at(b, now).is_ok());
    }

    #[test]
    fn test_window_reopens() {
        let limiter = limiter(1, 0);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let start = Instant::now();

        assert!(limiter.check_at(ip, start).is_ok());
        let retry = limiter.check_at(ip, start).unwrap_err();
        assert_eq!(retry, Duration::from_secs(60));

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at(ip, later).is_ok());
    }

    #[test]
    fn test_cleanup_keeps_fresh_windows() {
        let limiter = limiter(5, 0);
        limiter.check("10.0.0.1".parse().unwrap()).unwrap();
        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
