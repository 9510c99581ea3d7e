//! Rate limiting middleware for axum.
//!
//! Applies one `RateLimitRule` to the routes it layers. Each request is
//! counted under the client address and the matched route path, so the
//! same rule on two routes keeps two independent windows per client.
//!
//! The client address is the socket peer. `X-Forwarded-For` and
//! `X-Real-IP` are only honored when the peer is a configured trusted
//! proxy; otherwise any client could pick its own identity.
//!
//! Rejected requests get `429 Too Many Requests` with a JSON body and a
//! `Retry-After` header carrying the rule's interval:
//!
//! ```text
//! HTTP/1.1 429 Too Many Requests
//! Retry-After: 300
//!
//! {"code":429,"message":"Too many requests. Limit is 2 requests in 300 seconds"}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::post, middleware};
//!
//! let guard = RateLimitGuard::new(limiter, RateLimitRule::post(10, 60)?)
//!     .with_trusted_proxies(["10.0.0.2".parse()?]);
//!
//! let app = Router::new()
//!     .route("/api/v1/challenges/attempt", post(attempt))
//!     .route_layer(middleware::from_fn_with_state(guard, rate_limit_middleware));
//! ```
//!
//! Use `route_layer` so the matched path is known when the middleware runs.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::RateLimiter;
use crate::domain::rate_limit::{
    CallContext, RateLimitDecision, RateLimitRejection, RateLimitRule, RejectionBody,
    StoreFailurePolicy,
};

/// Identity used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

const STORE_UNAVAILABLE_MESSAGE: &str = "Rate limiter unavailable";

/// Middleware state: a limiter, the rule it enforces and what to do when
/// the store fails.
#[derive(Debug, Clone)]
pub struct RateLimitGuard {
    limiter: RateLimiter,
    rule: Arc<RateLimitRule>,
    policy: StoreFailurePolicy,
    operation: Option<Arc<str>>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimitGuard {
    pub fn new(limiter: RateLimiter, rule: RateLimitRule) -> Self {
        Self {
            limiter,
            rule: Arc::new(rule),
            policy: StoreFailurePolicy::default(),
            operation: None,
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn with_policy(mut self, policy: StoreFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Count every layered route under one operation id instead of the
    /// matched path.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(Arc::from(operation.into()));
        self
    }

    /// Peers whose forwarded headers name the real client.
    ///
    /// Empty by default: forwarded headers are ignored.
    pub fn with_trusted_proxies(mut self, proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        self.trusted_proxies = proxies.into_iter().collect();
        self
    }

    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    pub fn policy(&self) -> StoreFailurePolicy {
        self.policy
    }

    pub fn trusted_proxies(&self) -> &[IpAddr] {
        &self.trusted_proxies
    }

    fn operation_for(&self, request: &Request) -> String {
        if let Some(operation) = &self.operation {
            return operation.to_string();
        }
        request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string())
    }
}

/// Rate limiting middleware enforcing a single rule.
///
/// This middleware:
/// 1. Skips counting entirely when the request method is not the rule's
/// 2. Identifies the client by its socket address, or by forwarded headers
///    when the peer is a trusted proxy
/// 3. Counts the call under `prefix:client:operation`
/// 4. Returns 429 when the window is exhausted
/// 5. Applies the store failure policy when counting fails
pub async fn rate_limit_middleware(
    State(guard): State<RateLimitGuard>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    if !guard.rule.applies_to(request.method()) {
        return next.run(request).await;
    }

    let identity = extract_client_ip(&request, connect_info.as_ref(), &guard.trusted_proxies)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    let operation = guard.operation_for(&request);
    let call = CallContext::new(request.method().clone(), identity, operation);

    match guard.limiter.check_and_record(&guard.rule, &call).await {
        Ok(RateLimitDecision::Rejected(rejection)) => rejection.into_response(),
        Ok(_) => next.run(request).await,
        Err(e) => {
            if guard.policy.admits_on_failure() {
                tracing::warn!(
                    operation = %call.operation_id,
                    "Rate limiter unavailable, admitting request: {}",
                    e
                );
                next.run(request).await
            } else {
                tracing::error!(
                    operation = %call.operation_id,
                    "Rate limiter unavailable, refusing request: {}",
                    e
                );
                store_unavailable_response()
            }
        }
    }
}

/// Extract client IP from request.
///
/// Forwarded headers are read only when the socket peer is in
/// `trusted_proxies`. Order of precedence then is:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
///
/// Without a socket address there is nothing to trust, so `None` is
/// returned.
pub fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trusted_proxies: &[IpAddr],
) -> Option<String> {
    let peer = connect_info.map(|ci| ci.0.ip())?;
    if !trusted_proxies.contains(&peer) {
        return Some(peer.to_string());
    }

    // The first entry is the original client, before any proxies
    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return Some(ip.to_string());
    }

    Some(peer.to_string())
}

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(self.body())).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.interval_secs));
        response
    }
}

fn store_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(RejectionBody {
            code: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: STORE_UNAVAILABLE_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::counter_store::InMemoryCounterStore;
    use crate::ports::{CounterStore, CounterStoreError};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        middleware,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<u64>, CounterStoreError> {
            Err(CounterStoreError::unavailable("connection refused"))
        }

        async fn set(&self, _key: &str, _value: u64, _expiry_secs: u64) -> Result<(), CounterStoreError> {
            Err(CounterStoreError::unavailable("connection refused"))
        }
    }

    fn guard_with(store: Arc<dyn CounterStore>, limit: u64) -> RateLimitGuard {
        RateLimitGuard::new(
            RateLimiter::new(store),
            RateLimitRule::new(Method::POST, limit, 300, "rl").unwrap(),
        )
    }

    fn app(guard: RateLimitGuard) -> Router {
        Router::new()
            .route("/submit", post(|| async { "submitted" }).get(|| async { "form" }))
            .route("/register", post(|| async { "registered" }))
            .route_layer(middleware::from_fn_with_state(guard, rate_limit_middleware))
    }

    const PROXY: [u8; 4] = [10, 9, 9, 9];

    fn peer(ip: &str) -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 51000))
    }

    /// POST arriving directly from `ip`.
    fn post_from(uri: &str, ip: &str) -> Request<Body> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(peer(ip));
        request
    }

    /// POST from `ip` as reported by `via` in `X-Forwarded-For`.
    fn post_forwarded(uri: &str, ip: &str, via: &str) -> Request<Body> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(peer(via));
        request
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // IP Extraction Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn trusted() -> Vec<IpAddr> {
        vec![IpAddr::from(PROXY)]
    }

    fn via_proxy() -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::from((PROXY, 443)))
    }

    #[test]
    fn extract_ip_from_x_forwarded_for_via_trusted_proxy() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4, 5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &trusted());
        assert_eq!(ip, Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_ip_from_x_real_ip_via_trusted_proxy() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Real-IP", "9.8.7.6")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &trusted());
        assert_eq!(ip, Some("9.8.7.6".to_string()));
    }

    #[test]
    fn extract_ip_prefers_x_forwarded_for() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .header("X-Real-IP", "5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &trusted());
        assert_eq!(ip, Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_ip_skips_blank_forwarded_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", " ")
            .header("X-Real-IP", "5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &trusted());
        assert_eq!(ip, Some("5.6.7.8".to_string()));
    }

    #[test]
    fn extract_ip_trusted_proxy_without_headers_is_the_client() {
        let request = Request::builder().uri("/test").body(()).unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &trusted());
        assert_eq!(ip, Some("10.9.9.9".to_string()));
    }

    #[test]
    fn extract_ip_ignores_headers_from_untrusted_peer() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .header("X-Real-IP", "5.6.7.8")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&peer("10.1.2.3")), &trusted());
        assert_eq!(ip, Some("10.1.2.3".to_string()));
    }

    #[test]
    fn extract_ip_ignores_headers_when_no_proxy_is_trusted() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, Some(&via_proxy()), &[]);
        assert_eq!(ip, Some("10.9.9.9".to_string()));
    }

    #[test]
    fn extract_ip_returns_none_without_socket_address() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4")
            .body(())
            .unwrap();

        let ip = extract_client_ip(&request, None, &trusted());
        assert_eq!(ip, None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn admits_until_limit_then_returns_429() {
        let app = app(guard_with(Arc::new(InMemoryCounterStore::new()), 2));

        for _ in 0..2 {
            let response = app.clone().oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "300");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "code": 429,
                "message": "Too many requests. Limit is 2 requests in 300 seconds"
            })
        );
    }

    #[tokio::test]
    async fn counts_under_client_and_matched_path() {
        let store = Arc::new(InMemoryCounterStore::new());
        let app = app(guard_with(store.clone(), 5));

        app.oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();

        assert_eq!(store.get("rl:10.0.0.1:/submit").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn other_methods_pass_without_counting() {
        let store = Arc::new(InMemoryCounterStore::new());
        let app = app(guard_with(store.clone(), 0));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/submit")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn routes_and_clients_have_separate_windows() {
        let app = app(guard_with(Arc::new(InMemoryCounterStore::new()), 1));

        let first = app.clone().oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();
        let other_route = app.clone().oneshot(post_from("/register", "10.0.0.1")).await.unwrap();
        let other_client = app.clone().oneshot(post_from("/submit", "10.0.0.2")).await.unwrap();
        let repeat = app.oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(other_route.status(), StatusCode::OK);
        assert_eq!(other_client.status(), StatusCode::OK);
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn fixed_operation_shares_window_across_routes() {
        let guard = guard_with(Arc::new(InMemoryCounterStore::new()), 1).with_operation("writes");
        let app = app(guard);

        let first = app.clone().oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();
        let second = app.oneshot(post_from("/register", "10.0.0.1")).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn rotating_forwarded_header_from_untrusted_peer_is_still_limited() {
        let store = Arc::new(InMemoryCounterStore::new());
        let app = app(guard_with(store.clone(), 1));

        let mut admitted = 0;
        for i in 0..20 {
            let spoofed = format!("1.1.1.{}", i);
            let response = app
                .clone()
                .oneshot(post_forwarded("/submit", &spoofed, "203.0.113.7"))
                .await
                .unwrap();
            if response.status() == StatusCode::OK {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("rl:203.0.113.7:/submit").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn trusted_proxy_counts_forwarded_clients_separately() {
        let store = Arc::new(InMemoryCounterStore::new());
        let guard = guard_with(store.clone(), 1).with_trusted_proxies(trusted());
        let app = app(guard);

        let alice = app
            .clone()
            .oneshot(post_forwarded("/submit", "198.51.100.1", "10.9.9.9"))
            .await
            .unwrap();
        let bob = app
            .clone()
            .oneshot(post_forwarded("/submit", "198.51.100.2", "10.9.9.9"))
            .await
            .unwrap();
        let alice_again = app
            .oneshot(post_forwarded("/submit", "198.51.100.1", "10.9.9.9"))
            .await
            .unwrap();

        assert_eq!(alice.status(), StatusCode::OK);
        assert_eq!(bob.status(), StatusCode::OK);
        assert_eq!(alice_again.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(store.get("rl:198.51.100.1:/submit").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn missing_client_address_counts_as_unknown() {
        let store = Arc::new(InMemoryCounterStore::new());
        let app = app(guard_with(store.clone(), 5));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/submit")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap();

        assert_eq!(store.get("rl:unknown:/submit").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn store_failure_fails_open_by_default() {
        let app = app(guard_with(Arc::new(DownStore), 1));

        let response = app.oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn store_failure_fails_closed_when_configured() {
        let guard = guard_with(Arc::new(DownStore), 1).with_policy(StoreFailurePolicy::FailClosed);
        let app = app(guard);

        let response = app.oneshot(post_from("/submit", "10.0.0.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "code": 503, "message": "Rate limiter unavailable" })
        );
    }

    #[tokio::test]
    async fn handler_can_return_rejection_from_guard() {
        let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
        let rule = RateLimitRule::new(Method::POST, 0, 60, "rl").unwrap();
        let call = CallContext::new(Method::POST, "10.0.0.1", "flag");

        let handler = move || {
            let limiter = limiter.clone();
            let rule = rule.clone();
            let call = call.clone();
            async move {
                match limiter.guard(&rule, &call, || async { "correct" }).await {
                    Ok(Ok(body)) => body.into_response(),
                    Ok(Err(rejection)) => rejection.into_response(),
                    Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
                }
            }
        };
        let app = Router::new().route("/flag", get(handler));

        let get_flag = || Request::builder().uri("/flag").body(Body::empty()).unwrap();
        let ok = app.clone().oneshot(get_flag()).await.unwrap();
        let limited = app.oneshot(get_flag()).await.unwrap();

        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Type Safety Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn no_proxies_are_trusted_by_default() {
        let guard = guard_with(Arc::new(InMemoryCounterStore::new()), 1);
        assert!(guard.trusted_proxies().is_empty());
    }

    #[test]
    fn rate_limit_guard_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RateLimitGuard>();
    }
}
