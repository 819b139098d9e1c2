//! Auth gateway: API key authentication plus rate-limit enforcement.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the `X-API-Key` header
//! 2. Hash it and validate it against the key store
//! 3. Count the request against the key's per-minute quota
//! 4. Attach `X-RateLimit-*` headers to the response
//! 5. Reject unauthorized requests with 401, over-quota requests with 429
//!
//! Authentication and rate limiting short-circuit before any handler
//! runs, so a rejected request never reaches the shipment store.

use crate::{
    AppState,
    error::AppError,
    services::api_key_service::{self, KeyValidation},
};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers can extract it to
/// know which key made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key (the rate-limit principal)
    pub api_key_id: Uuid,

    /// Name of the key's owner
    pub key_name: String,

    /// The key's per-window quota
    pub rate_limit: i32,
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract the `X-API-Key` header; missing ⇒ 401
/// 2. Validate the key (digest lookup, status, expiry)
/// 3. Valid key ⇒ one rate-limiter check against the key's quota; the
///    decision's limit/remaining/reset are echoed on the response whether
///    the request passes or is rejected with 429
/// 4. Invalid key ⇒ 401 with the validator's reason — unless the
///    presented value matches the configured legacy static secret, which
///    is allowed through without rate limiting (backward compatibility;
///    disabled when `LEGACY_API_KEY` is unset)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("API key missing. Include the X-API-Key header".to_string())
        })?
        .to_string();

    match api_key_service::validate(&state.pool, &api_key).await? {
        KeyValidation::Valid(record) => {
            let context = AuthContext {
                api_key_id: record.id,
                key_name: record.name,
                rate_limit: record.rate_limit,
            };

            // One check per request; the same decision drives both the
            // allow/deny outcome and the response headers.
            let principal = format!("api_key:{}", context.api_key_id);
            let decision = state.rate_limiter.check(&principal, context.rate_limit);

            tracing::debug!(
                api_key = %context.key_name,
                remaining = decision.remaining,
                allowed = decision.allowed,
                "api key authenticated"
            );

            request.extensions_mut().insert(context);

            let mut response = if decision.allowed {
                next.run(request).await
            } else {
                AppError::RateLimited {
                    limit: decision.limit,
                    retry_after: decision.retry_after_secs(Utc::now()),
                }
                .into_response()
            };

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
            headers.insert(
                "X-RateLimit-Reset",
                HeaderValue::from(decision.reset_at.timestamp()),
            );

            Ok(response)
        }
        KeyValidation::Invalid(rejection) => {
            // Legacy fallback: a single static shared secret, accepted
            // only when explicitly configured. Bypasses rate limiting.
            let is_legacy = state
                .legacy_api_key
                .as_deref()
                .is_some_and(|legacy| !legacy.is_empty() && legacy == api_key);

            if is_legacy {
                tracing::warn!("request authenticated via legacy static API key");
                Ok(next.run(request).await)
            } else {
                Err(AppError::Unauthorized(rejection.message().to_string()))
            }
        }
    }
}
