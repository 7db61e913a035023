//! Liveness/readiness probes, grounded on the teacher's own
//! `axum-resilient-kv-store` example (`health_live`/`health_ready`):
//! liveness always answers `200`; readiness reflects whether the storage
//! backend and the breakers guarding it are actually usable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::AppState;

/// Always `200` once the process is accepting connections at all.
pub async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "alive"}))
}

/// `200` only if the storage backend is reachable and its circuit breaker
/// isn't open; `503` otherwise, so an orchestrator can stop routing traffic
/// here without killing the process.
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let storage_status = state.storage.status().await;
    let storage_breaker = state.circuit_breakers.get_or_default("storage").await;
    let breaker_state = storage_breaker.state().await;

    let healthy = storage_status.healthy && !matches!(breaker_state, mediaforge_circuitbreaker::CircuitState::Open);
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(serde_json::json!({
            "status": if healthy { "ready" } else { "degraded" },
            "storage": {
                "healthy": storage_status.healthy,
                "backend_type": storage_status.backend_type,
                "detail": storage_status.detail,
            },
            "storage_circuit": format!("{:?}", breaker_state),
        })),
    )
}
