//! HTTP handlers for the laptop inventory

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Laptop, LaptopFilter, NewLaptopInput};
use crate::services::LaptopService;
use crate::AppState;
use shared::{Pagination, PaginatedResponse};

/// Register a standalone laptop
pub async fn create_laptop(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewLaptopInput>,
) -> AppResult<(StatusCode, Json<Laptop>)> {
    let service = LaptopService::new(state.db);
    let laptop = service.create_laptop(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(laptop)))
}

/// List laptops
pub async fn list_laptops(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<LaptopFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Laptop>>> {
    let service = LaptopService::new(state.db);
    let laptops = service
        .list_laptops(&current_user.0, filter, pagination)
        .await?;
    Ok(Json(laptops))
}

/// Get a laptop by ID
pub async fn get_laptop(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(laptop_id): Path<Uuid>,
) -> AppResult<Json<Laptop>> {
    let service = LaptopService::new(state.db);
    let laptop = service.get_laptop(&current_user.0, laptop_id).await?;
    Ok(Json(laptop))
}
