//! Job submission, lookup, listing, and cancellation (spec §4.K, §6 "Job
//! submission"). Handlers extract/authenticate and shape the response;
//! `mediaforge_orchestrator::JobOrchestrator` owns validation, persistence,
//! caching, and dispatch.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use mediaforge_core::{Error as CoreError, Kind};
use mediaforge_orchestrator::JobRequest;
use serde::Deserialize;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

pub async fn submit(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(request): Json<JobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.orchestrator.accept(request, &credential.id, chrono::Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.orchestrator.get(&job_id).await?.ok_or_else(|| CoreError::storage(format!("no such job: {job_id}")))?;
    if job.credential_id != credential.id {
        return Err(ApiError(CoreError::new(Kind::Authorization, "job does not belong to this credential")));
    }
    Ok(Json(job))
}

pub async fn list(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.orchestrator.list(&credential.id, params.offset, params.limit).await?;
    Ok(Json(serde_json::json!({"jobs": page.jobs, "total": page.total})))
}

pub async fn cancel(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = state.orchestrator.get(&job_id).await?.ok_or_else(|| CoreError::storage(format!("no such job: {job_id}")))?;
    if existing.credential_id != credential.id {
        return Err(ApiError(CoreError::new(Kind::Authorization, "job does not belong to this credential")));
    }
    let job = state.orchestrator.cancel(&job_id, chrono::Utc::now()).await?;
    Ok(Json(job))
}
