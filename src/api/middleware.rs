//! Optional bearer-token authentication and per-client rate limiting.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Security settings for a deployed server. Everything is off by default.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Bearer token required on every API request except `/health`.
    pub api_key: Option<String>,
    /// Allowed CORS origins. Any origin when unset.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limiter: Option<RateLimiter>,
}

impl SecurityConfig {
    /// Read `FAMILY_BALANCE_API_KEY`, `FAMILY_BALANCE_CORS_ORIGINS`
    /// (comma-separated) and `FAMILY_BALANCE_RATE_LIMIT` (requests per minute
    /// per client).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup("FAMILY_BALANCE_API_KEY").filter(|k| !k.is_empty());

        let cors_origins = lookup("FAMILY_BALANCE_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });

        let rate_limiter = lookup("FAMILY_BALANCE_RATE_LIMIT")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .map(|n| RateLimiter::new(n, RATE_WINDOW));

        Self {
            api_key,
            cors_origins,
            rate_limiter,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u32) -> Self {
        self.rate_limiter = Some(RateLimiter::new(max_requests, RATE_WINDOW));
        self
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match &self.cors_origins {
            None => CorsLayer::permissive(),
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match HeaderValue::from_str(o) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            tracing::warn!("Ignoring invalid CORS origin: {}", o);
                            None
                        }
                    })
                    .collect();
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(tower_http::cors::Any)
                    .allow_headers(tower_http::cors::Any)
            }
        }
    }
}

/// In-memory sliding-window limiter keyed by client address.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a request from `ip`. Returns false when the client is over its
    /// limit for the current window.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();

        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        let entry = requests.entry(ip).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() < self.max_requests as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Drop clients with no requests in the current window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < self.window);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().expect("rate limiter lock poisoned").len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &config.api_key else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer "));

    match token {
        Some(Some(token)) if token == expected_key => Ok(next.run(request).await),
        Some(Some(_)) => {
            tracing::warn!("Rejected request with invalid API key");
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(None) => {
            tracing::warn!("Rejected request with malformed Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Rejected request without Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = extract_client_ip(&request);

    if rate_limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rate limit exceeded for {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Client address from `X-Forwarded-For` (first hop) or `X-Real-IP`,
/// otherwise loopback.
fn extract_client_ip(request: &Request<Body>) -> IpAddr {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    header("X-Forwarded-For")
        .and_then(|v| v.split(',').next().and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| header("X-Real-IP").and_then(|v| v.trim().parse().ok()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn rate_limiter_blocks_requests_over_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn rate_limiter_tracks_ips_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let ip1: IpAddr = "10.0.0.1".parse().unwrap();
        let ip2: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(ip1));
        assert!(!limiter.check(ip1));
        assert!(limiter.check(ip2));
    }

    #[test]
    fn cleanup_forgets_idle_clients() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1));
        limiter.check("10.0.0.1".parse().unwrap());
        assert_eq!(limiter.tracked_clients(), 1);

        std::thread::sleep(Duration::from_millis(5));
        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn reads_settings_from_environment() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FAMILY_BALANCE_API_KEY", "secret"),
            ("FAMILY_BALANCE_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("FAMILY_BALANCE_RATE_LIMIT", "30"),
        ]);
        let config = SecurityConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.cors_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert!(config.rate_limiter.is_some());
    }

    #[test]
    fn builders_enable_each_feature() {
        let config = SecurityConfig::disabled()
            .with_api_key("k")
            .with_cors_origins(vec!["https://a.example".to_string(), "\n".to_string()])
            .with_rate_limit(10);

        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.cors_origins.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.rate_limiter.as_ref().map(|l| l.window()), Some(RATE_WINDOW));
        let _ = config.cors_layer();
    }

    #[test]
    fn nothing_enabled_without_environment() {
        let config = SecurityConfig::from_lookup(|_| None);
        assert!(config.api_key.is_none());
        assert!(config.cors_origins.is_none());
        assert!(config.rate_limiter.is_none());
    }
}
