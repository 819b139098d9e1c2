//! Business logic services, called by the HTTP handlers.

pub mod api_key_service;
pub mod audit_service;
pub mod shipment_service;
