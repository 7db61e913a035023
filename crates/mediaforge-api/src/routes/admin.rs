//! Admin surface: storage health, the completed-job cleanup sweep, and API
//! key lifecycle management (spec §4.L "Admin endpoints require the
//! credential's admin flag"). Every handler here requires
//! [`AdminAuthenticated`]; the logic itself lives in
//! `mediaforge_orchestrator::admin` and `mediaforge-model`'s `ApiCredential`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use mediaforge_core::Error as CoreError;
use mediaforge_model::{ApiCredential, Tier, DEFAULT_MAX_CONCURRENT_JOBS};
use mediaforge_orchestrator::{cleanup_old_jobs, storage_backend_status};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::AdminAuthenticated;
use crate::error::ApiError;
use crate::AppState;

pub async fn storage_status(State(state): State<AppState>, AdminAuthenticated(_admin): AdminAuthenticated) -> impl IntoResponse {
    Json(storage_backend_status(state.storage.as_ref()).await)
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    #[serde(default = "default_older_than_days")]
    pub older_than_days: i64,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_older_than_days() -> i64 {
    30
}

pub async fn cleanup_jobs(
    State(state): State<AppState>,
    AdminAuthenticated(_admin): AdminAuthenticated,
    Query(params): Query<CleanupParams>,
) -> Result<impl IntoResponse, ApiError> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(params.older_than_days);
    let report = cleanup_old_jobs(state.jobs.as_ref(), state.storage.as_ref(), cutoff, params.dry_run).await?;
    Ok(Json(report))
}

pub async fn list_api_keys(State(state): State<AppState>, AdminAuthenticated(_admin): AdminAuthenticated) -> Result<impl IntoResponse, ApiError> {
    let credentials = state.credentials.list().await?;
    let redacted: Vec<_> = credentials.iter().map(redact).collect();
    Ok(Json(redacted))
}

/// What a credential looks like over the wire: everything but the secret
/// hash (spec §3 "Identity: opaque secret, stored only as a keyed hash";
/// the hash itself has no business leaving the process either).
#[derive(Debug, Serialize)]
struct RedactedCredential {
    id: String,
    tier: Tier,
    active: bool,
    admin: bool,
    max_concurrent_jobs: u32,
    revoked_at: Option<chrono::DateTime<chrono::Utc>>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn redact(credential: &ApiCredential) -> RedactedCredential {
    RedactedCredential {
        id: credential.id.clone(),
        tier: credential.tier,
        active: credential.active,
        admin: credential.admin,
        max_concurrent_jobs: credential.max_concurrent_jobs,
        revoked_at: credential.revoked_at,
        expires_at: credential.expires_at,
        created_at: credential.created_at,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub admin: bool,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: u32,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_max_concurrent_jobs() -> u32 {
    DEFAULT_MAX_CONCURRENT_JOBS
}

#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    /// Returned exactly once, at creation time; never retrievable again.
    secret: String,
    credential: RedactedCredential,
}

/// Generates an opaque bearer token. Two concatenated v4 UUIDs give 244 bits
/// of randomness from the `uuid` crate's own RNG, the same source this
/// codebase already trusts for job and batch ids, rather than pulling in a
/// dedicated `rand` dependency for one call site.
fn generate_secret() -> String {
    format!("mf_{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

pub async fn create_api_key(
    State(state): State<AppState>,
    AdminAuthenticated(_admin): AdminAuthenticated,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=100).contains(&request.max_concurrent_jobs) {
        return Err(ApiError(CoreError::validation("max_concurrent_jobs must be between 1 and 100")));
    }

    let secret = generate_secret();
    let credential = ApiCredential {
        id: uuid::Uuid::new_v4().to_string(),
        secret_hash: hash_secret(&secret),
        tier: request.tier,
        active: true,
        admin: request.admin,
        max_concurrent_jobs: request.max_concurrent_jobs,
        revoked_at: None,
        expires_at: request.expires_at,
        created_at: chrono::Utc::now(),
    };
    state.credentials.save(&credential).await?;

    Ok((StatusCode::CREATED, Json(CreateApiKeyResponse { secret, credential: redact(&credential) })))
}

pub async fn revoke_api_key(
    State(state): State<AppState>,
    AdminAuthenticated(_admin): AdminAuthenticated,
    Path(credential_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut credential = state
        .credentials
        .get(&credential_id)
        .await?
        .ok_or_else(|| CoreError::storage(format!("no such credential: {credential_id}")))?;

    credential.revoked_at = Some(chrono::Utc::now());
    credential.active = false;
    state.credentials.save(&credential).await?;
    state.cache.delete(&mediaforge_cache::KeyBuilder::api_key_validation_key(&credential.secret_hash)).await;

    Ok(Json(redact(&credential)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_unique_and_hash_deterministically() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert_eq!(hash_secret(&a), hash_secret(&a));
        assert_ne!(hash_secret(&a), hash_secret(&b));
    }
}
