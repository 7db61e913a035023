//! HTTP surface (spec §4.L): axum router wiring auth, rate-limiting, CORS,
//! and body-size enforcement around the job orchestrator, batch scheduler,
//! and admin surface. Grounded on the teacher's own
//! `examples/axum-resilient-kv-store` for the `AppState`/`Router::with_state`
//! shape, generalized from one resource to this service's several.

pub mod auth;
pub mod config;
pub mod error;
pub mod ip_allowlist;
pub mod rate_limit;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use mediaforge_batch::{BatchRepository, Scheduler};
use mediaforge_cache::Cache;
use mediaforge_circuitbreaker::Registry as CircuitBreakerRegistry;
use mediaforge_orchestrator::{CredentialRepository, JobOrchestrator, JobRepository};
use mediaforge_ratelimiter::RateLimiter;
use mediaforge_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::ip_allowlist::IpAllowlist;

/// Everything a handler or extractor needs, held behind `Arc` so cloning
/// `AppState` for each request is cheap (mirrors the teacher's own
/// `AppState` clone-per-request pattern).
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub jobs: Arc<dyn JobRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub batches: Arc<dyn BatchRepository>,
    pub scheduler: Arc<Scheduler>,
    pub cache: Arc<Cache>,
    pub storage: Arc<dyn Storage>,
    pub rate_limiter: Arc<RateLimiter>,
    pub ip_allowlist: Arc<IpAllowlist>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        orchestrator: Arc<JobOrchestrator>,
        jobs: Arc<dyn JobRepository>,
        credentials: Arc<dyn CredentialRepository>,
        batches: Arc<dyn BatchRepository>,
        scheduler: Arc<Scheduler>,
        cache: Arc<Cache>,
        storage: Arc<dyn Storage>,
        rate_limiter: Arc<RateLimiter>,
        circuit_breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        let ip_allowlist = Arc::new(IpAllowlist::new(&settings.ip_allowlist));
        Self {
            settings: Arc::new(settings),
            orchestrator,
            jobs,
            credentials,
            batches,
            scheduler,
            cache,
            storage,
            rate_limiter,
            ip_allowlist,
            circuit_breakers,
        }
    }
}

/// Builds the full router: routes, rate-limit middleware, then the
/// tower-http trace/timeout/cors/body-limit layers, applied outermost-last
/// so they see every request before a handler or the rate limiter does.
pub fn app(state: AppState) -> Router {
    let cors = build_cors(&state.settings.cors_origins);
    let max_body_size = state.settings.max_body_size_bytes as usize;

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/healthz", get(routes::health::healthz))
        .route("/jobs", post(routes::jobs::submit).get(routes::jobs::list))
        .route("/jobs/:job_id", get(routes::jobs::get))
        .route("/jobs/:job_id/cancel", post(routes::jobs::cancel))
        .route("/batches", post(routes::batches::create))
        .route("/batches/:batch_id", get(routes::batches::get))
        .route("/batches/:batch_id/cancel", post(routes::batches::cancel))
        .route("/admin/storage/status", get(routes::admin::storage_status))
        .route("/admin/jobs/cleanup", post(routes::admin::cleanup_jobs))
        .route("/admin/api-keys", get(routes::admin::list_api_keys).post(routes::admin::create_api_key))
        .route("/admin/api-keys/:credential_id", delete(routes::admin::revoke_api_key))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit::enforce))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(300)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An empty `cors_origins` list means same-origin only (`CorsLayer::new()`'s
/// default); a non-empty list is turned into an explicit allow-list rather
/// than `Any`, since credentials (the API key header) are exchanged over
/// these routes.
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new();
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION, "x-api-key".parse().unwrap()])
}
