//! Shipment data models and API request/response types.
//!
//! This module defines:
//! - `Shipment`: Database entity for a shipment tied to an external order
//! - `ShipmentEvent`: Immutable tracking-timeline entry owned by a shipment
//! - `ShipmentStatus` / `ShipmentEventType`: Postgres-backed enums
//! - Request types for creating shipments, changing status, adding events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a shipment.
///
/// The normal progression is `pending → packed → shipped → in_transit →
/// delivered`, with `exception` and `cancelled` reachable from any
/// non-terminal state. The service does not enforce a transition table:
/// any status may be set from any current status (matching the upstream
/// behavior this service replaces). `delivered` and `cancelled` are
/// terminal in practice only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Packed,
    Shipped,
    InTransit,
    Delivered,
    Exception,
    Cancelled,
}

impl ShipmentStatus {
    /// Event type synthesized on the tracking timeline when a shipment
    /// moves to this status.
    ///
    /// Only `delivered` and `exception` map to their own event types;
    /// every other status change is recorded as an `in_transit` event.
    pub fn implied_event_type(self) -> ShipmentEventType {
        match self {
            ShipmentStatus::Delivered => ShipmentEventType::Delivered,
            ShipmentStatus::Exception => ShipmentEventType::Exception,
            _ => ShipmentEventType::InTransit,
        }
    }

    /// Whether no further transition is expected in normal operation.
    ///
    /// Informational only; `update_status` does not reject transitions
    /// out of terminal statuses.
    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Wire representation (snake_case), used in generated event messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Packed => "packed",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Exception => "exception",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a tracking-timeline event.
///
/// A superset vocabulary independent of `ShipmentStatus`: carriers report
/// things like `picked_up` and `out_for_delivery` that have no status
/// counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipment_event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentEventType {
    Created,
    Packed,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
}

/// Represents a shipment record from the database.
///
/// # Database Table
///
/// Maps to the `shipments` table. `order_id` references an order in the
/// vendor's orders service; no foreign key is enforced because orders
/// live in another system.
///
/// `updated_at` advances on every status change and drives the default
/// list ordering (most recently touched first).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Unique identifier for this shipment
    pub id: Uuid,

    /// External order this shipment fulfills
    pub order_id: i64,

    /// Current lifecycle status
    pub status: ShipmentStatus,

    /// Carrier handling the shipment (e.g. "DHL")
    pub carrier: Option<String>,

    /// Carrier-issued tracking number
    pub tracking_number: Option<String>,

    /// Public tracking page for this shipment
    pub tracking_url: Option<String>,

    /// When the shipment was created
    pub created_at: DateTime<Utc>,

    /// When the status last changed
    pub updated_at: DateTime<Utc>,
}

/// Represents a tracking event record from the database.
///
/// Events are immutable once created. Insertion order is preserved in
/// storage; responses order them by `occurred_at` descending for display.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// Owning shipment (events are deleted with their shipment)
    pub shipment_id: Uuid,

    /// What happened
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: ShipmentEventType,

    /// Where it happened, free-form (e.g. "CDMX hub")
    pub location: Option<String>,

    /// Human-readable detail
    pub message: Option<String>,

    /// When it happened (caller-suppliable; defaults to insertion time)
    pub occurred_at: DateTime<Utc>,

    /// When the row was written
    pub created_at: DateTime<Utc>,
}

/// Shipment plus its tracking timeline, as returned by get-by-id.
#[derive(Debug, Serialize)]
pub struct ShipmentWithEvents {
    #[serde(flatten)]
    pub shipment: Shipment,

    /// Events ordered by `occurred_at` descending
    pub events: Vec<ShipmentEvent>,
}

/// Request body for creating a new shipment.
///
/// # JSON Example
///
/// ```json
/// {
///   "orderId": 123,
///   "status": "pending",
///   "carrier": "DHL",
///   "trackingNumber": "JD014600003889",
///   "trackingUrl": "https://www.dhl.com/track?id=JD014600003889"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    /// External order id
    pub order_id: i64,

    /// Initial status (defaults to `pending`)
    #[serde(default = "default_status")]
    pub status: ShipmentStatus,

    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

/// Default status when not specified in the request.
fn default_status() -> ShipmentStatus {
    ShipmentStatus::Pending
}

/// Request body for changing a shipment's status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status (any value from the enum is accepted)
    pub to_status: ShipmentStatus,

    /// Recorded as the synthesized event's message when present
    pub reason: Option<String>,
}

/// Request body for appending a tracking event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventRequest {
    #[serde(rename = "type")]
    pub event_type: ShipmentEventType,

    pub location: Option<String>,
    pub message: Option<String>,

    /// Defaults to now when omitted
    pub occurred_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_and_exception_keep_their_event_type() {
        assert_eq!(
            ShipmentStatus::Delivered.implied_event_type(),
            ShipmentEventType::Delivered
        );
        assert_eq!(
            ShipmentStatus::Exception.implied_event_type(),
            ShipmentEventType::Exception
        );
    }

    #[test]
    fn other_statuses_imply_in_transit_events() {
        for status in [
            ShipmentStatus::Pending,
            ShipmentStatus::Packed,
            ShipmentStatus::Shipped,
            ShipmentStatus::InTransit,
            ShipmentStatus::Cancelled,
        ] {
            assert_eq!(status.implied_event_type(), ShipmentEventType::InTransit);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(!ShipmentStatus::Pending.is_terminal());
        assert!(!ShipmentStatus::Exception.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::InTransit).unwrap(),
            "\"in_transit\""
        );
        let parsed: ShipmentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::Cancelled);
    }

    #[test]
    fn create_request_defaults_status_to_pending() {
        let req: CreateShipmentRequest = serde_json::from_str(r#"{"orderId": 123}"#).unwrap();
        assert_eq!(req.status, ShipmentStatus::Pending);
        assert_eq!(req.order_id, 123);
        assert!(req.carrier.is_none());
    }

    #[test]
    fn add_event_request_accepts_wire_type_field() {
        let req: AddEventRequest = serde_json::from_str(
            r#"{"type": "out_for_delivery", "location": "CDMX hub"}"#,
        )
        .unwrap();
        assert_eq!(req.event_type, ShipmentEventType::OutForDelivery);
        assert!(req.occurred_at.is_none());
    }
}
