//! HTTP middleware components.
//!
//! Middleware run before route handlers. The auth gateway authenticates
//! requests and enforces per-key quotas using the shared rate limiter.

/// API key authentication gateway
pub mod auth;
/// Fixed-window rate limiter shared across requests
pub mod rate_limit;
