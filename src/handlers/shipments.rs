//! Shipment HTTP handlers.
//!
//! This module implements the shipment endpoints (all behind the auth
//! gateway):
//! - GET  /v1/shipments              - List shipments (optional orderId filter)
//! - GET  /v1/shipments/{id}         - Get a shipment with its events
//! - POST /v1/shipments              - Create a shipment
//! - PUT  /v1/shipments/{id}/status  - Change a shipment's status
//! - POST /v1/shipments/{id}/events  - Append a tracking event

use crate::{
    AppState,
    error::AppError,
    models::shipment::{
        AddEventRequest, CreateShipmentRequest, Shipment, ShipmentEvent, ShipmentWithEvents,
        UpdateStatusRequest,
    },
    services::shipment_service,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for listing shipments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShipmentsQuery {
    /// Narrow the listing to one external order
    pub order_id: Option<i64>,
}

/// List shipments, most recently updated first.
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ListShipmentsQuery>,
) -> Result<Json<Vec<Shipment>>, AppError> {
    let shipments = shipment_service::list(&state.pool, query.order_id).await?;
    Ok(Json(shipments))
}

/// Get a shipment by id, embedding its tracking timeline.
///
/// Returns 404 if the shipment does not exist.
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentWithEvents>, AppError> {
    let shipment = shipment_service::get_by_id(&state.pool, id).await?;
    Ok(Json(shipment))
}

/// Create a new shipment.
///
/// # Request Body
///
/// ```json
/// {
///   "orderId": 123,
///   "carrier": "DHL",
///   "trackingNumber": "JD014600003889"
/// }
/// ```
///
/// # Response (201 Created)
///
/// The created shipment with its synthesized `created` event.
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(request): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentWithEvents>), AppError> {
    let shipment = shipment_service::create(&state.pool, &state.audit, request).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// Change a shipment's status.
///
/// # Request Body
///
/// ```json
/// { "toStatus": "in_transit", "reason": "left warehouse" }
/// ```
///
/// Responds with the updated shipment, including the event the status
/// change appended to the timeline.
pub async fn update_shipment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ShipmentWithEvents>, AppError> {
    let shipment = shipment_service::update_status(&state.pool, &state.audit, id, request).await?;
    Ok(Json(shipment))
}

/// Append a tracking event to a shipment.
///
/// Returns 404 (and writes nothing) for an unknown shipment id.
pub async fn add_shipment_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddEventRequest>,
) -> Result<(StatusCode, Json<ShipmentEvent>), AppError> {
    let event = shipment_service::add_event(&state.pool, &state.audit, id, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
