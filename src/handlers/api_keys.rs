//! API key management HTTP handlers.
//!
//! This module implements the key-management endpoints:
//! - GET    /v1/api-keys      - List all keys
//! - POST   /v1/api-keys      - Create a key (returns the plaintext once)
//! - PUT    /v1/api-keys/{id} - Partially update a key
//! - DELETE /v1/api-keys/{id} - Revoke a key
//!
//! These routes are on the public whitelist: they are the bootstrap path
//! for issuing the very credentials the gateway checks.

use crate::{
    AppState,
    error::AppError,
    models::api_key::{
        ApiKey, CreateApiKeyRequest, CreatedApiKeyResponse, RevokedApiKeyResponse,
        UpdateApiKeyRequest,
    },
    services::api_key_service,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// List all API keys.
///
/// Key hashes are not serialized; plaintext keys are never recoverable.
pub async fn list_api_keys(State(state): State<AppState>) -> Result<Json<Vec<ApiKey>>, AppError> {
    let keys = api_key_service::list(&state.pool).await?;
    Ok(Json(keys))
}

/// Create a new API key.
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "key": "sk_3f8a...",
///   "apiKey": { "id": "...", "name": "warehouse-integration", "rateLimit": 200, "...": "..." }
/// }
/// ```
///
/// The `key` field is the plaintext secret; it is shown here and never
/// again.
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreatedApiKeyResponse>), AppError> {
    let (key, api_key) = api_key_service::create(&state.pool, request).await?;

    Ok((StatusCode::CREATED, Json(CreatedApiKeyResponse { key, api_key })))
}

/// Partially update an API key.
///
/// Returns 404 if the key does not exist.
pub async fn update_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApiKeyRequest>,
) -> Result<Json<ApiKey>, AppError> {
    let api_key = api_key_service::update(&state.pool, id, request).await?;
    Ok(Json(api_key))
}

/// Revoke an API key.
///
/// Idempotent: revoking a revoked key responds 200 with the same record.
pub async fn revoke_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RevokedApiKeyResponse>, AppError> {
    let api_key = api_key_service::revoke(&state.pool, id).await?;

    Ok(Json(RevokedApiKeyResponse {
        message: "API key revoked successfully".to_string(),
        api_key,
    }))
}
