//! API key extraction and validation (spec §4.L, §6): primary `X-API-Key`
//! header, alternative `Authorization: Bearer`. Validation is cache-checked
//! first, then the credential repository, mirroring `api/dependencies.py`'s
//! `require_api_key` (cache lookup, then `ApiKeyService.validate_api_key`,
//! then cache the result).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mediaforge_cache::{Category, KeyBuilder};
use mediaforge_core::Error as CoreError;
use mediaforge_model::ApiCredential;
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::AppState;

fn token_hash(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get("x-api-key") {
        return value.to_str().ok().map(str::to_string);
    }
    if let Some(value) = parts.headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    None
}

pub fn client_ip(parts: &Parts) -> String {
    if let Some(forwarded) = parts.headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                return first.trim().to_string();
            }
        }
    }
    parts
        .extensions
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A request's authenticated credential, resolved via header extraction,
/// cache lookup, repository fallback, and IP allow-list enforcement.
pub struct Authenticated(pub ApiCredential);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(|| {
            ApiError(CoreError::new(mediaforge_core::Kind::Authentication, "API key required"))
        })?;
        let hash = token_hash(&token);
        let cache_key = KeyBuilder::api_key_validation_key(&hash);

        let credential = if let Some(cached) = state.cache.get::<ApiCredential>(&cache_key).await {
            cached
        } else {
            let credential = state
                .credentials
                .find_by_secret_hash(&hash)
                .await
                .map_err(ApiError)?
                .ok_or_else(|| ApiError(CoreError::authentication("invalid API key")))?;
            state.cache.set(&cache_key, &credential, Category::ApiKey).await;
            credential
        };

        if !credential.is_usable(chrono::Utc::now()) {
            return Err(ApiError(CoreError::authentication("API key is inactive, revoked, or expired")));
        }

        if state.settings.enable_ip_allowlist {
            let ip = client_ip(parts);
            if !state.ip_allowlist.allows(&ip) {
                return Err(ApiError(CoreError::new(mediaforge_core::Kind::Authorization, "IP address not authorized")));
            }
        }

        Ok(Authenticated(credential))
    }
}

/// Like [`Authenticated`] but additionally requires the credential's admin
/// flag (spec §4.L "Admin endpoints require the credential's admin flag").
pub struct AdminAuthenticated(pub ApiCredential);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(credential) = Authenticated::from_request_parts(parts, state).await?;
        if !credential.admin {
            return Err(ApiError(CoreError::new(mediaforge_core::Kind::Authorization, "admin access required")));
        }
        Ok(AdminAuthenticated(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable() {
        assert_eq!(token_hash("abc"), token_hash("abc"));
        assert_ne!(token_hash("abc"), token_hash("xyz"));
    }
}
