//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that receives extracted request
//! data, calls into the service layer, and returns a JSON response or
//! an `AppError`.

/// API key management endpoints
pub mod api_keys;
/// Health check endpoint
pub mod health;
/// Shipment and tracking-event endpoints
pub mod shipments;
