//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types exposed over HTTP.

/// API key authentication model
pub mod api_key;
/// Outbound audit-log payloads
pub mod audit;
/// Shipments and tracking events
pub mod shipment;
