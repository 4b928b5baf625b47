//! HTTP handlers for shipment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Laptop, PickupForm, PickupFormData, Shipment};
use crate::services::lifecycle::UpdateStatusInput;
use crate::services::shipment::{ShipmentDetail, ShipmentFilter};
use crate::services::{
    LifecycleService, NotificationService, PickupFormService, ShipmentService,
};
use crate::AppState;
use shared::{AddLaptopInput, EditEligibility, Pagination, PaginatedResponse, UpdateShipmentInput};

// ============================================================================
// Shipment CRUD
// ============================================================================

/// Create a shipment of any type.
///
/// The body is routed on `shipment_type`; bodies in the older single
/// shipment shape are accepted too.
pub async fn create_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<ShipmentDetail>)> {
    let notifications =
        NotificationService::new(state.db.clone(), state.config.notifications.clone());
    let service = ShipmentService::new(state.db).with_notifications(notifications);
    let shipment = service.create_shipment(&current_user.0, body).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// List shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<ShipmentFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Shipment>>> {
    let service = ShipmentService::new(state.db);
    let shipments = service
        .list_shipments(&current_user.0, filter, pagination)
        .await?;
    Ok(Json(shipments))
}

/// Get a shipment with its laptops and pickup form
pub async fn get_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<ShipmentDetail>> {
    let service = ShipmentService::new(state.db);
    let shipment = service.get_shipment(&current_user.0, shipment_id).await?;
    Ok(Json(shipment))
}

/// Edit the mutable fields of a shipment
pub async fn update_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<UpdateShipmentInput>,
) -> AppResult<Json<ShipmentDetail>> {
    let service = ShipmentService::new(state.db);
    let shipment = service
        .update_shipment(&current_user.0, shipment_id, input)
        .await?;
    Ok(Json(shipment))
}

/// Whether the shipment can still be edited, and why
pub async fn get_edit_eligibility(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<EditEligibility>> {
    let service = ShipmentService::new(state.db);
    let eligibility = service.edit_eligibility(&current_user.0, shipment_id).await?;
    Ok(Json(eligibility))
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Move a shipment to a new status
pub async fn update_shipment_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<Shipment>> {
    let notifications =
        NotificationService::new(state.db.clone(), state.config.notifications.clone());
    let service = LifecycleService::new(state.db, notifications);
    let shipment = service
        .update_status(&current_user.0, shipment_id, input)
        .await?;
    Ok(Json(shipment))
}

/// Submit or replace the pickup form
pub async fn submit_pickup_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(form): Json<PickupFormData>,
) -> AppResult<Json<PickupForm>> {
    let service = PickupFormService::new(state.db);
    let saved = service
        .submit_pickup_form(&current_user.0, shipment_id, form)
        .await?;
    Ok(Json(saved))
}

/// Add a laptop to a bulk shipment
pub async fn add_laptop_to_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<AddLaptopInput>,
) -> AppResult<(StatusCode, Json<Laptop>)> {
    let service = ShipmentService::new(state.db);
    let laptop = service
        .add_laptop_to_bulk_shipment(&current_user.0, shipment_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(laptop)))
}
