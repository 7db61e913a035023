//! Batch submission, lookup, and cancellation (spec §4.J). The route's own
//! job is what `mediaforge_batch::Scheduler` doesn't do: validating every
//! child's locators/operations up front (so a batch never half-persists)
//! and turning wire-shaped `JobRequest`s into `Job` entities. Promotion
//! itself, and the first tick right after creation, is the batch
//! driver's job (`mediaforge_batch::Driver`, run as a background task);
//! this handler only persists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use mediaforge_command::validate::{validate_operation, validate_options};
use mediaforge_core::{Error as CoreError, Kind};
use mediaforge_model::{Batch, Job};
use mediaforge_orchestrator::parse_locator;
use mediaforge_worker::operations::{parse_operations, parse_options};
use serde::Deserialize;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub jobs: Vec<mediaforge_orchestrator::JobRequest>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    #[serde(default)]
    pub priority: i32,
}

fn default_max_concurrent() -> u32 {
    5
}

fn build_child(request: mediaforge_orchestrator::JobRequest, batch_id: &str, credential_id: &str, now: chrono::DateTime<chrono::Utc>) -> Result<Job, CoreError> {
    parse_locator(&request.input_path)?;
    parse_locator(&request.output_path)?;

    let operations = parse_operations(&request.operations)?;
    for operation in &operations {
        validate_operation(operation)?;
    }
    let options = parse_options(&request.options)?;
    validate_options(&options)?;

    let mut job = Job::new(uuid::Uuid::new_v4().to_string(), request.input_path, request.output_path, credential_id, now);
    job.operations = request.operations;
    job.options = request.options;
    job.webhook_url = request.webhook_url;
    job.batch_id = Some(batch_id.to_string());
    Ok(job)
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(request): Json<BatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.jobs.is_empty() {
        return Err(ApiError(CoreError::validation("a batch must contain at least one job")));
    }

    let now = chrono::Utc::now();
    let batch_id = uuid::Uuid::new_v4().to_string();
    let mut children = Vec::with_capacity(request.jobs.len());
    for job_request in request.jobs {
        children.push(build_child(job_request, &batch_id, &credential.id, now).map_err(ApiError)?);
    }

    let mut batch = Batch::new(batch_id, credential.id, children.len() as u32, request.max_concurrent, now);
    batch.priority = request.priority;

    let batch = state.scheduler.enqueue(batch, children).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn get(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(batch_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .batches
        .load_batch(&batch_id)
        .await?
        .ok_or_else(|| CoreError::storage(format!("no such batch: {batch_id}")))?;
    if batch.credential_id != credential.id {
        return Err(ApiError(CoreError::new(Kind::Authorization, "batch does not belong to this credential")));
    }
    let children = state.batches.children(&batch_id).await?;
    Ok(Json(serde_json::json!({"batch": batch, "status": batch.status(), "jobs": children})))
}

pub async fn cancel(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(batch_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = state
        .batches
        .load_batch(&batch_id)
        .await?
        .ok_or_else(|| CoreError::storage(format!("no such batch: {batch_id}")))?;
    if existing.credential_id != credential.id {
        return Err(ApiError(CoreError::new(Kind::Authorization, "batch does not belong to this credential")));
    }
    let batch = state.scheduler.cancel(&batch_id, chrono::Utc::now()).await?;
    Ok(Json(batch))
}
