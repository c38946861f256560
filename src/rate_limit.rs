//! Fixed-window request limiter keyed by caller address.
//!
//! State is per process. Several instances behind a load balancer each keep
//! their own windows, so the effective limit scales with the instance count.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_in: Duration },
    Limited { reset_in: Duration },
}

#[derive(Debug)]
struct Window {
    count: u32,
    resets_at: Instant,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    trust_proxy: bool,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            trust_proxy: false,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Key callers on the hop our reverse proxy appends to `X-Forwarded-For`.
    /// Only enable behind a proxy that sets the header; otherwise clients choose their key.
    pub fn behind_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count one request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Drop expired windows so the map tracks active callers only.
        windows.retain(|_, w| now < w.resets_at);

        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            resets_at: now + self.config.window,
        });
        window.count += 1;

        let reset_in = window.resets_at.saturating_duration_since(now);
        if window.count > self.config.max_requests {
            RateDecision::Limited { reset_in }
        } else {
            RateDecision::Allowed {
                remaining: self.config.max_requests - window.count,
                reset_in,
            }
        }
    }
}

/// Caller key: the peer address, or behind a trusted proxy the last
/// `x-forwarded-for` hop, which is the one the proxy appended.
fn caller_key(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
        {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn apply_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_in: Duration) {
    let reset_secs = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
}

/// Middleware enforcing the limiter held in state.
pub async fn enforce(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let key = caller_key(&request, limiter.trust_proxy);
    let limit = limiter.config().max_requests;

    match limiter.check(&key) {
        RateDecision::Allowed {
            remaining,
            reset_in,
        } => {
            let mut response = next.run(request).await;
            apply_headers(response.headers_mut(), limit, remaining, reset_in);
            response
        }
        RateDecision::Limited { reset_in } => {
            tracing::warn!(caller = %key, path = %request.uri().path(), "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new(
                    "Too many requests, please try again later.",
                )),
            )
                .into_response();
            apply_headers(response.headers_mut(), limit, 0, reset_in);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use tower::ServiceExt;

    fn limiter(max: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_eleventh_request_in_window_is_rejected() {
        let limiter = limiter(10);
        let start = Instant::now();

        for i in 0..10 {
            let decision = limiter.check_at("10.0.0.1", start + Duration::from_secs(i));
            assert!(
                matches!(decision, RateDecision::Allowed { .. }),
                "request {} should pass",
                i + 1
            );
        }

        let eleventh = limiter.check_at("10.0.0.1", start + Duration::from_secs(30));
        assert!(matches!(eleventh, RateDecision::Limited { .. }));
    }

    #[test]
    fn test_request_one_window_later_is_accepted() {
        let limiter = limiter(10);
        let start = Instant::now();
        for _ in 0..11 {
            limiter.check_at("10.0.0.1", start);
        }

        let later = limiter.check_at("10.0.0.1", start + Duration::from_secs(60));
        assert_eq!(
            later,
            RateDecision::Allowed {
                remaining: 9,
                reset_in: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn test_callers_are_counted_separately() {
        let limiter = limiter(1);
        let now = Instant::now();
        assert!(matches!(
            limiter.check_at("a", now),
            RateDecision::Allowed { remaining: 0, .. }
        ));
        assert!(matches!(
            limiter.check_at("a", now),
            RateDecision::Limited { .. }
        ));
        assert!(matches!(
            limiter.check_at("b", now),
            RateDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_middleware_sets_headers_and_rejects() {
        let limiter = limiter(1);
        let app = Router::new()
            .route("/limited", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, enforce));

        let request = || {
            axum::http::Request::post("/limited")
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-ratelimit-limit"], "1");
        assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    fn forwarded_request(forwarded_for: &str, peer: [u8; 4]) -> Request {
        let mut request = axum::http::Request::post("/limited")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        request
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_reset_the_count() {
        let app = Router::new()
            .route("/limited", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter(1), enforce));

        let first = app
            .clone()
            .oneshot(forwarded_request("10.0.0.1", [198, 51, 100, 4]))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        for i in 2..6 {
            let res = app
                .clone()
                .oneshot(forwarded_request(&format!("10.0.0.{i}"), [198, 51, 100, 4]))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    #[test]
    fn test_trusted_proxy_keys_on_the_appended_hop() {
        let request = forwarded_request("1.2.3.4, 203.0.113.7", [10, 0, 0, 2]);
        assert_eq!(caller_key(&request, true), "203.0.113.7");
        assert_eq!(caller_key(&request, false), "10.0.0.2");
    }
}
