//! Rate-limit middleware (spec §4.D): runs before a request reaches its
//! handler, keyed on the credential if presented or the client IP
//! otherwise. Sets the `X-RateLimit-*` headers on every response and adds
//! `Retry-After` on a 429, mirroring `RateLimitMiddleware.dispatch` in
//! `api/middleware/security.py`.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::client_ip;
use crate::error::ApiError;
use crate::AppState;

pub async fn enforce(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.settings.rate_limit_enabled {
        return next.run(req).await;
    }

    let id = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| client_ip(&request_parts(&req)));

    let decision = match state.rate_limiter.check(Some(&id)).await {
        Ok(decision) => decision,
        Err(err) => return ApiError(err).into_response(),
    };

    if !decision.allowed {
        let seconds = if decision.hourly.remaining == 0 { 3600 } else { 86400 };
        let err = mediaforge_core::Error::rate_limit("rate limit exceeded")
            .with_retry_after(std::time::Duration::from_secs(seconds));
        return ApiError(err).into_response();
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    insert(headers, "x-ratelimit-limit-hour", decision.hourly.limit);
    insert(headers, "x-ratelimit-remaining-hour", decision.hourly.remaining);
    insert(headers, "x-ratelimit-limit-day", decision.daily.limit);
    insert(headers, "x-ratelimit-remaining-day", decision.daily.remaining);
    response
}

/// Rebuilds just the header/extension parts of `req` for [`client_ip`],
/// which only reads headers and the `ConnectInfo` extension.
fn request_parts(req: &Request) -> axum::http::request::Parts {
    let mut builder = axum::http::Request::builder().method(req.method().clone()).uri(req.uri().clone());
    for (name, value) in req.headers() {
        builder = builder.header(name, value);
    }
    let mut built = builder.body(()).expect("rebuilding request parts from an existing request");
    *built.extensions_mut() = req.extensions().clone();
    built.into_parts().0
}

fn insert(headers: &mut axum::http::HeaderMap, name: &'static str, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, value);
    }
}
