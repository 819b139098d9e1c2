//! Shipment service - shipment store and status state machine.
//!
//! This service handles:
//! - Shipment creation with its synthesized `created` event
//! - Status changes and the event type each target status implies
//! - Free-form tracking events
//! - Audit snapshots around every mutation
//!
//! # Atomicity
//!
//! Mutations that touch both the shipment row and its events (create,
//! status change) run inside a single PostgreSQL transaction, so a
//! shipment can never end up with a status change and no matching event.
//!
//! # Transition policy
//!
//! Any target status is accepted from any current status; there is no
//! legality table. See `ShipmentStatus` for the rationale.

use crate::{
    db::DbPool,
    error::AppError,
    models::audit::{AuditAction, AuditRecord},
    models::shipment::{
        AddEventRequest, CreateShipmentRequest, Shipment, ShipmentEvent, ShipmentEventType,
        ShipmentWithEvents, UpdateStatusRequest,
    },
    services::audit_service::AuditEmitter,
};
use serde_json::json;
use uuid::Uuid;

/// Entity name used in audit records.
const ENTITY_TYPE: &str = "shipments";

/// List shipments, most recently updated first.
///
/// `order_id` narrows the result to shipments for one external order.
pub async fn list(pool: &DbPool, order_id: Option<i64>) -> Result<Vec<Shipment>, AppError> {
    let shipments = match order_id {
        Some(order_id) => {
            sqlx::query_as::<_, Shipment>(
                "SELECT * FROM shipments WHERE order_id = $1 ORDER BY updated_at DESC",
            )
            .bind(order_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Shipment>("SELECT * FROM shipments ORDER BY updated_at DESC")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(shipments)
}

/// Get a shipment with its tracking timeline.
///
/// Events are ordered by `occurred_at` descending (newest first).
/// Fails with `ShipmentNotFound` if `id` does not exist.
pub async fn get_by_id(pool: &DbPool, id: Uuid) -> Result<ShipmentWithEvents, AppError> {
    let shipment = sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::ShipmentNotFound(id))?;

    let events = sqlx::query_as::<_, ShipmentEvent>(
        "SELECT * FROM shipment_events WHERE shipment_id = $1 ORDER BY occurred_at DESC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ShipmentWithEvents { shipment, events })
}

/// Create a shipment.
///
/// # Process
///
/// 1. Validate the tracking URL shape, when present
/// 2. Insert the shipment (status defaults to `pending`)
/// 3. Append the `created` event in the same transaction
/// 4. Emit an audit record with the created snapshot
///
/// Returns the shipment including its single `created` event.
pub async fn create(
    pool: &DbPool,
    audit: &AuditEmitter,
    request: CreateShipmentRequest,
) -> Result<ShipmentWithEvents, AppError> {
    if let Some(ref tracking_url) = request.tracking_url {
        validate_tracking_url(tracking_url)?;
    }

    let mut tx = pool.begin().await?;

    let shipment = sqlx::query_as::<_, Shipment>(
        r#"
        INSERT INTO shipments (order_id, status, carrier, tracking_number, tracking_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(request.order_id)
    .bind(request.status)
    .bind(request.carrier)
    .bind(request.tracking_number)
    .bind(request.tracking_url)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO shipment_events (shipment_id, type, message, occurred_at)
        VALUES ($1, $2, $3, NOW())
        "#,
    )
    .bind(shipment.id)
    .bind(ShipmentEventType::Created)
    .bind("Shipment creado")
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let created = get_by_id(pool, shipment.id).await?;

    audit.emit(
        AuditRecord::new(AuditAction::Create, ENTITY_TYPE, created.shipment.id)
            .with_changes(None, Some(serde_json::to_value(&created).unwrap_or_default()))
            .with_metadata(json!({ "source": "shipments-backend" })),
    );

    Ok(created)
}

/// Change a shipment's status.
///
/// # Process
///
/// 1. Capture the "before" snapshot (full shipment with events)
/// 2. Update the status and `updated_at`
/// 3. Append the event the target status implies (`delivered` →
///    `delivered`, `exception` → `exception`, anything else →
///    `in_transit`), with `reason` as its message when given
/// 4. Re-fetch the "after" snapshot
/// 5. Emit an audit record with both snapshots
///
/// Steps 2 and 3 share one transaction. The "before" snapshot may race
/// with a concurrent update; it is diagnostic, not authoritative.
pub async fn update_status(
    pool: &DbPool,
    audit: &AuditEmitter,
    id: Uuid,
    request: UpdateStatusRequest,
) -> Result<ShipmentWithEvents, AppError> {
    // Doubles as the existence check
    let before = get_by_id(pool, id).await?;

    let message = request
        .reason
        .clone()
        .unwrap_or_else(|| format!("Status cambiado a {}", request.to_status));

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE shipments SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(request.to_status)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO shipment_events (shipment_id, type, message, occurred_at)
        VALUES ($1, $2, $3, NOW())
        "#,
    )
    .bind(id)
    .bind(request.to_status.implied_event_type())
    .bind(&message)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let after = get_by_id(pool, id).await?;

    audit.emit(
        AuditRecord::new(AuditAction::StatusChange, ENTITY_TYPE, id)
            .with_changes(
                Some(serde_json::to_value(&before).unwrap_or_default()),
                Some(serde_json::to_value(&after).unwrap_or_default()),
            )
            .with_metadata(json!({
                "source": "shipments-backend",
                "reason": request.reason,
            })),
    );

    Ok(after)
}

/// Append a free-form tracking event to a shipment.
///
/// `occurred_at` defaults to now. The shipment's status and `updated_at`
/// are deliberately untouched: carrier timeline entries are not status
/// changes. Fails with `ShipmentNotFound` for an unknown shipment and
/// writes nothing in that case.
pub async fn add_event(
    pool: &DbPool,
    audit: &AuditEmitter,
    id: Uuid,
    request: AddEventRequest,
) -> Result<ShipmentEvent, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM shipments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::ShipmentNotFound(id))?;

    let event = sqlx::query_as::<_, ShipmentEvent>(
        r#"
        INSERT INTO shipment_events (shipment_id, type, location, message, occurred_at)
        VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(request.event_type)
    .bind(request.location)
    .bind(request.message)
    .bind(request.occurred_at)
    .fetch_one(pool)
    .await?;

    audit.emit(
        AuditRecord::new(AuditAction::EventAdded, ENTITY_TYPE, id)
            .with_changes(None, Some(serde_json::to_value(&event).unwrap_or_default()))
            .with_metadata(json!({ "source": "shipments-backend" })),
    );

    Ok(event)
}

/// Validate a tracking URL.
///
/// # Rules
///
/// - Must parse as a URL
/// - Must use http or https
/// - Maximum 2048 characters
fn validate_tracking_url(tracking_url: &str) -> Result<(), AppError> {
    if tracking_url.len() > 2048 {
        return Err(AppError::InvalidRequest(
            "trackingUrl exceeds 2048 characters".to_string(),
        ));
    }

    let parsed = url::Url::parse(tracking_url)
        .map_err(|_| AppError::InvalidRequest("trackingUrl is not a valid URL".to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(AppError::InvalidRequest(
            "trackingUrl must use http or https".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_url_accepts_http_and_https() {
        assert!(validate_tracking_url("https://www.dhl.com/track?id=JD01").is_ok());
        assert!(validate_tracking_url("http://localhost:3000/track/1").is_ok());
    }

    #[test]
    fn tracking_url_rejects_other_schemes() {
        assert!(validate_tracking_url("ftp://example.com/track").is_err());
        assert!(validate_tracking_url("not a url").is_err());
    }

    #[test]
    fn tracking_url_rejects_oversized_input() {
        let long = format!("https://example.com/{}", "a".repeat(2048));
        assert!(validate_tracking_url(&long).is_err());
    }

    #[test]
    fn generated_status_message_names_the_target() {
        use crate::models::shipment::ShipmentStatus;

        let request = UpdateStatusRequest {
            to_status: ShipmentStatus::InTransit,
            reason: None,
        };
        let message = request
            .reason
            .clone()
            .unwrap_or_else(|| format!("Status cambiado a {}", request.to_status));
        assert_eq!(message, "Status cambiado a in_transit");
    }
}
