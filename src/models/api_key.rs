//! API key model and management request/response types.
//!
//! API keys authenticate callers of the shipments API. Only a SHA-256
//! digest of the key is stored; the plaintext is returned once, at
//! creation, and never again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activation state of an API key.
///
/// `revoked` is terminal: a revoked key never validates again, and
/// revoking it a second time is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "api_key_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Inactive,
    Revoked,
}

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table. The `key_hash` column is unique and is
/// how validation finds a key: hash the presented plaintext, look up the
/// digest. The hash is never serialized into responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: Uuid,

    /// SHA-256 hex digest of the plaintext key (64 hex characters)
    #[serde(skip_serializing)]
    pub key_hash: String,

    /// Human-readable name for the key's owner or purpose
    pub name: String,

    /// Scope labels attached to the key (informational in this service)
    pub scopes: Vec<String>,

    /// Requests allowed per 60-second window (1..=10000)
    pub rate_limit: i32,

    /// Optional expiry; a key with `expires_at` in the past never validates
    pub expires_at: Option<DateTime<Utc>>,

    /// Who created the key, when known
    pub created_by: Option<Uuid>,

    /// When the key was created
    pub created_at: DateTime<Utc>,

    /// Updated on every successful validation (asynchronously)
    pub last_used_at: Option<DateTime<Utc>>,

    /// Activation state
    pub status: ApiKeyStatus,
}

/// Request body for creating a new API key.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "warehouse-integration",
///   "scopes": ["shipments:write"],
///   "rateLimit": 200,
///   "expiresAt": "2027-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub name: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// Per-key quota (defaults to 100 requests per minute)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: i32,

    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}

/// Default per-key rate limit when not specified in the request.
fn default_rate_limit() -> i32 {
    100
}

/// Request body for partially updating an API key.
///
/// Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    pub name: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub rate_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: Option<ApiKeyStatus>,
}

/// Response when creating an API key.
///
/// The `key` field carries the plaintext secret and is the only place it
/// ever appears.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApiKeyResponse {
    pub key: String,
    pub api_key: ApiKey,
}

/// Response when revoking an API key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedApiKeyResponse {
    pub message: String,
    pub api_key: ApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let req: CreateApiKeyRequest =
            serde_json::from_str(r#"{"name": "warehouse-integration"}"#).unwrap();
        assert_eq!(req.rate_limit, 100);
        assert!(req.scopes.is_empty());
        assert!(req.expires_at.is_none());
    }

    #[test]
    fn key_hash_is_never_serialized() {
        let key = ApiKey {
            id: Uuid::new_v4(),
            key_hash: "deadbeef".to_string(),
            name: "test".to_string(),
            scopes: vec![],
            rate_limit: 100,
            expires_at: None,
            created_by: None,
            created_at: Utc::now(),
            last_used_at: None,
            status: ApiKeyStatus::Active,
        };
        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("keyHash").is_none());
        assert!(json.get("key_hash").is_none());
        assert_eq!(json["status"], "active");
    }
}
