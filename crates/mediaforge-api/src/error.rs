//! HTTP error envelope (spec §4.L, §6, §7): `{error: {code, message, type,
//! level, [details]}}`. [`Sanitizer::sanitize`] runs exactly once, here, at
//! the HTTP boundary; everything upstream passes the raw message through.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediaforge_core::{Error as CoreError, Kind, Sanitizer, Severity};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
    level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Wraps [`mediaforge_core::Error`] so it can be returned directly from an
/// axum handler.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

fn status_for(kind: Kind) -> StatusCode {
    match kind {
        Kind::Validation => StatusCode::BAD_REQUEST,
        Kind::Security => StatusCode::FORBIDDEN,
        Kind::Authentication => StatusCode::UNAUTHORIZED,
        Kind::Authorization => StatusCode::FORBIDDEN,
        Kind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        Kind::Processing => StatusCode::UNPROCESSABLE_ENTITY,
        Kind::Storage => StatusCode::NOT_FOUND,
        Kind::Network | Kind::Timeout => StatusCode::BAD_GATEWAY,
        Kind::Configuration | Kind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn level_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let severity = kind.severity();
        let status = status_for(kind);

        // Only low/medium-severity errors ever surface a sanitized detail
        // message (spec §7); everything else gets a fixed, kind-specific
        // phrase so an internal failure mode never leaks through wording.
        let details = if severity <= Severity::Medium {
            Some(Sanitizer::sanitize(self.0.message()))
        } else {
            None
        };

        #[cfg(feature = "tracing")]
        if severity >= Severity::High {
            tracing::error!(kind = ?kind, "{}", Sanitizer::sanitize(self.0.message()));
        }

        let mut response = Json(ErrorEnvelope {
            error: ErrorBody {
                code: kind.code(),
                message: fixed_message(kind).to_string(),
                kind: kind_label(kind),
                level: level_for(severity),
                details,
            },
        })
        .into_response();
        *response.status_mut() = status;

        if let Some(retry_after) = self.0.retry_after() {
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.as_secs().to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

fn kind_label(kind: Kind) -> &'static str {
    match kind {
        Kind::Validation => "validation",
        Kind::Security => "security",
        Kind::Authentication => "authentication",
        Kind::Authorization => "authorization",
        Kind::RateLimit => "rate_limit",
        Kind::Processing => "processing",
        Kind::Storage => "storage",
        Kind::Network => "network",
        Kind::Timeout => "timeout",
        Kind::Configuration => "configuration",
        Kind::Internal => "internal",
    }
}

fn fixed_message(kind: Kind) -> &'static str {
    match kind {
        Kind::Validation => "the request failed validation",
        Kind::Security => "request rejected for security reasons",
        Kind::Authentication => "authentication failed",
        Kind::Authorization => "access denied",
        Kind::RateLimit => "rate limit exceeded",
        Kind::Processing => "processing failed",
        Kind::Storage => "requested resource was not found",
        Kind::Network => "a downstream dependency is unreachable",
        Kind::Timeout => "the operation timed out",
        Kind::Configuration => "internal configuration error",
        Kind::Internal => "internal error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_surfaces_sanitized_detail() {
        let err = ApiError(CoreError::validation("trim.duration must be > 0"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert!(json["error"]["details"].as_str().unwrap().contains("trim.duration"));
    }

    #[tokio::test]
    async fn internal_error_never_includes_details() {
        let err = ApiError(CoreError::internal("connect to postgres://user:pw@host/db failed"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"]["details"].is_null());
    }

    #[tokio::test]
    async fn rate_limit_error_sets_retry_after_header() {
        let err = ApiError(CoreError::rate_limit("too many requests").with_retry_after(std::time::Duration::from_secs(3600)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(axum::http::header::RETRY_AFTER).unwrap(), "3600");
    }
}
