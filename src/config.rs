//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment
//! variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 8000
/// - `AUDIT_API_URL` (optional): base URL of the external audit-log sink,
///   defaults to `http://localhost:8000`
/// - `AUDIT_API_KEY` (optional): bearer credential for the audit sink;
///   when unset, audit emission is skipped with a warning
/// - `LEGACY_API_KEY` (optional): static shared secret accepted as an
///   always-allowed credential, bypassing rate limiting; kept only for
///   backward compatibility and disabled entirely when unset
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_audit_api_url")]
    pub audit_api_url: String,

    pub audit_api_key: Option<String>,

    pub legacy_api_key: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    8000
}

/// Default audit sink if AUDIT_API_URL environment variable is not set.
fn default_audit_api_url() -> String {
    "http://localhost:8000".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config
    /// struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
