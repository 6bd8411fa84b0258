use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug)]
struct Window {
    opened: Instant,
    hits: u32,
}

/// Fixed-window per-IP request limiter.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
    max_hits: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_hits: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_hits,
            window,
        }
    }

    /// Count a request from `ip`; returns `false` once the window is full.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(ip).or_insert(Window {
            opened: now,
            hits: 0,
        });

        if now.duration_since(entry.opened) >= self.window {
            entry.opened = now;
            entry.hits = 0;
        }

        entry.hits += 1;
        entry.hits <= self.max_hits
    }

    /// Drop windows that have been idle longer than `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.duration_since(w.opened) < max_idle);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        // 120 requests per 10 seconds per client.
        Self::new(120, Duration::from_secs(10))
    }
}

pub async fn rate_limit_middleware(
    axum::extract::State(limiter): axum::extract::State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ip) = client_ip(&req) {
        if !limiter.allow(ip).await {
            warn!(ip = %ip, "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Try ConnectInfo first, then the first X-Forwarded-For hop.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(connect_info.0.ip());
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_fills_up() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.allow(ip).await);
        }
        assert!(!limiter.allow(ip).await);
    }

    #[tokio::test]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let ip1: IpAddr = "10.0.0.1".parse().unwrap();
        let ip2: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.allow(ip1).await);
        assert!(!limiter.allow(ip1).await);
        assert!(limiter.allow(ip2).await);
    }

    #[tokio::test]
    async fn purge_drops_idle_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let ip: IpAddr = "192.168.1.1".parse().unwrap();
        assert!(limiter.allow(ip).await);

        limiter.purge_idle(Duration::ZERO).await;

        let windows = limiter.windows.lock().await;
        assert!(windows.is_empty());
    }
}
