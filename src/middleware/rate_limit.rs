use crate::error::CampusPayError;
use anyhow::{Context, Result};
use axum::{
    http::{header::RETRY_AFTER, HeaderName, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    Router,
};
use std::time::Duration;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// Per-client-IP token bucket. The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for the peer
/// address to be visible.
pub fn apply_rate_limit(router: Router, per_second: u64, burst: u32) -> Result<Router> {
    let replenish_ms = 1_000 / per_second.clamp(1, 1_000);
    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(burst.max(1))
        .finish()
        .context("Invalid rate limit configuration")?;
    // Lives for the whole process.
    let config: &'static _ = Box::leak(Box::new(config));

    // Drop buckets of clients that have gone quiet.
    let limiter = config.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    tracing::info!(per_second, burst, "Rate limiting enabled");
    Ok(router
        .layer(GovernorLayer { config })
        .layer(map_response(rate_limit_envelope)))
}

const RATELIMIT_AFTER: HeaderName = HeaderName::from_static("x-ratelimit-after");

/// Rewrites the limiter's plain-text 429 into the JSON error body. The
/// wait time is kept and also offered as `Retry-After`.
async fn rate_limit_envelope(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let wait = response.headers().get(&RATELIMIT_AFTER).cloned();
    let mut enveloped = CampusPayError::RateLimitExceeded.into_response();
    if let Some(value) = wait {
        enveloped.headers_mut().insert(RETRY_AFTER, value.clone());
        enveloped.headers_mut().insert(RATELIMIT_AFTER, value);
    }
    enveloped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{HeaderValue, Request};
    use axum::routing::get;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    #[tokio::test]
    async fn too_many_requests_gets_error_body() {
        let mut limited = Response::new(Body::from("Too Many Requests! Wait for 2s"));
        *limited.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        limited
            .headers_mut()
            .insert(RATELIMIT_AFTER, HeaderValue::from_static("2"));

        let response = rate_limit_envelope(limited).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "2");
        assert_eq!(response.headers()[RATELIMIT_AFTER], "2");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "RATE_LIMIT_EXCEEDED");
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let response = rate_limit_envelope(Response::new(Body::from("ok"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    fn from_peer() -> Request<Body> {
        let mut request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40_000))));
        request
    }

    #[tokio::test]
    async fn burst_overflow_is_rejected_with_error_body() {
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let router = apply_rate_limit(router, 1, 1).unwrap();

        let first = router.clone().oneshot(from_peer()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router.oneshot(from_peer()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(RETRY_AFTER));

        let bytes = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "RATE_LIMIT_EXCEEDED");
    }
}
