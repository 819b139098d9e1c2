//! API key service - generation, hashing, CRUD and validation.
//!
//! Keys are high-entropy secrets: 32 random bytes, hex-encoded, with an
//! `sk_` prefix for identifiability. Only the SHA-256 digest is stored;
//! validation hashes the presented plaintext and looks the digest up.

use crate::{
    db::DbPool,
    error::AppError,
    models::api_key::{ApiKey, ApiKeyStatus, CreateApiKeyRequest, UpdateApiKeyRequest},
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Allowed range for a per-key rate limit.
const RATE_LIMIT_RANGE: std::ops::RangeInclusive<i32> = 1..=10000;

/// Why a presented key was rejected.
///
/// The distinct reasons surface in 401 responses so callers can tell an
/// unknown key from a revoked or expired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    NotFound,
    Inactive,
    Expired,
}

impl KeyRejection {
    pub fn message(self) -> &'static str {
        match self {
            KeyRejection::NotFound => "API key not found",
            KeyRejection::Inactive => "API key inactive or revoked",
            KeyRejection::Expired => "API key expired",
        }
    }
}

/// Outcome of validating a presented plaintext key.
#[derive(Debug)]
pub enum KeyValidation {
    Valid(ApiKey),
    Invalid(KeyRejection),
}

/// Generate a new plaintext API key.
///
/// 32 bytes of randomness (256 bits), hex-encoded, prefixed with `sk_`.
pub fn generate_key() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("sk_{}", hex::encode(bytes))
}

/// SHA-256 hex digest of a plaintext key.
///
/// This is the only form in which keys are persisted or looked up.
pub fn hash_key(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a new API key.
///
/// Returns the plaintext alongside the stored record; this is the only
/// time the plaintext exists outside the caller's hands.
pub async fn create(
    pool: &DbPool,
    request: CreateApiKeyRequest,
) -> Result<(String, ApiKey), AppError> {
    validate_rate_limit(request.rate_limit)?;

    let plaintext = generate_key();
    let key_hash = hash_key(&plaintext);

    let api_key = sqlx::query_as::<_, ApiKey>(
        r#"
        INSERT INTO api_keys (key_hash, name, scopes, rate_limit, expires_at, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&key_hash)
    .bind(&request.name)
    .bind(&request.scopes)
    .bind(request.rate_limit)
    .bind(request.expires_at)
    .bind(request.created_by)
    .fetch_one(pool)
    .await?;

    Ok((plaintext, api_key))
}

/// List all API keys, newest first.
pub async fn list(pool: &DbPool) -> Result<Vec<ApiKey>, AppError> {
    let keys = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(keys)
}

/// Partially update an API key.
///
/// Absent fields keep their stored values. Fails with `ApiKeyNotFound`
/// if `id` does not exist.
pub async fn update(
    pool: &DbPool,
    id: Uuid,
    request: UpdateApiKeyRequest,
) -> Result<ApiKey, AppError> {
    if let Some(rate_limit) = request.rate_limit {
        validate_rate_limit(rate_limit)?;
    }

    let api_key = sqlx::query_as::<_, ApiKey>(
        r#"
        UPDATE api_keys
        SET name = COALESCE($2, name),
            scopes = COALESCE($3, scopes),
            rate_limit = COALESCE($4, rate_limit),
            expires_at = COALESCE($5, expires_at),
            status = COALESCE($6, status)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(request.name)
    .bind(request.scopes)
    .bind(request.rate_limit)
    .bind(request.expires_at)
    .bind(request.status)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::ApiKeyNotFound(id))?;

    Ok(api_key)
}

/// Revoke an API key.
///
/// Idempotent: revoking an already-revoked key simply returns it again.
/// Fails with `ApiKeyNotFound` if `id` does not exist.
pub async fn revoke(pool: &DbPool, id: Uuid) -> Result<ApiKey, AppError> {
    let api_key = sqlx::query_as::<_, ApiKey>(
        "UPDATE api_keys SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(ApiKeyStatus::Revoked)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::ApiKeyNotFound(id))?;

    Ok(api_key)
}

/// Validate a presented plaintext key.
///
/// # Rejections
///
/// - Digest not found
/// - Status is not `active` (covers inactive and revoked)
/// - `expires_at` is in the past
///
/// On success, `last_used_at` is updated on a detached task so the
/// bookkeeping write never delays or fails the validation itself.
pub async fn validate(pool: &DbPool, plaintext: &str) -> Result<KeyValidation, AppError> {
    let key_hash = hash_key(plaintext);

    let Some(api_key) =
        sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE key_hash = $1")
            .bind(&key_hash)
            .fetch_optional(pool)
            .await?
    else {
        return Ok(KeyValidation::Invalid(KeyRejection::NotFound));
    };

    if api_key.status != ApiKeyStatus::Active {
        return Ok(KeyValidation::Invalid(KeyRejection::Inactive));
    }

    if let Some(expires_at) = api_key.expires_at {
        if expires_at < Utc::now() {
            return Ok(KeyValidation::Invalid(KeyRejection::Expired));
        }
    }

    touch_last_used(pool, api_key.id);

    Ok(KeyValidation::Valid(api_key))
}

/// Record that a key was just used, without blocking the caller.
fn touch_last_used(pool: &DbPool, id: Uuid) {
    let pool = pool.clone();
    tokio::spawn(async move {
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
        {
            tracing::warn!(api_key_id = %id, "failed to update last_used_at: {e}");
        }
    });
}

fn validate_rate_limit(rate_limit: i32) -> Result<(), AppError> {
    if RATE_LIMIT_RANGE.contains(&rate_limit) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "rateLimit must be between {} and {}",
            RATE_LIMIT_RANGE.start(),
            RATE_LIMIT_RANGE.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_prefixed_and_high_entropy() {
        let key = generate_key();
        assert!(key.starts_with("sk_"));
        // sk_ + 32 bytes hex-encoded
        assert_eq!(key.len(), 3 + 64);
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(generate_key(), generate_key());
    }

    #[test]
    fn hashing_is_deterministic_hex_sha256() {
        let digest = hash_key("sk_test");
        assert_eq!(digest, hash_key("sk_test"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, hash_key("sk_other"));
    }

    #[test]
    fn rate_limit_range_is_enforced() {
        assert!(validate_rate_limit(1).is_ok());
        assert!(validate_rate_limit(10000).is_ok());
        assert!(validate_rate_limit(0).is_err());
        assert!(validate_rate_limit(10001).is_err());
        assert!(validate_rate_limit(-5).is_err());
    }

    #[test]
    fn rejection_messages_are_distinct() {
        let messages = [
            KeyRejection::NotFound.message(),
            KeyRejection::Inactive.message(),
            KeyRejection::Expired.message(),
        ];
        assert_eq!(
            messages.len(),
            messages.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }
}
