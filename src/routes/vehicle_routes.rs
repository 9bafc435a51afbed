use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};

use crate::dto::order_dto::PageQuery;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateBatteryRequest, UpdateStatusRequest, VehicleResponse,
};
use crate::models::Caller;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_vehicles).post(create_vehicle))
        .route("/cars/:id", get(get_vehicle))
        .route("/cars/:id/status", put(update_status))
        .route("/cars/:id/battery", put(update_battery))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let vehicles = state.fleet.list_vehicles(query.into()).await?;
    let base_url = &state.config.public_base_url;
    Ok(Json(
        vehicles
            .into_iter()
            .map(|v| VehicleResponse::from_vehicle(v, base_url))
            .collect(),
    ))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = state.fleet.get_vehicle(id).await?;
    Ok(Json(VehicleResponse::from_vehicle(
        vehicle,
        &state.config.public_base_url,
    )))
}

async fn create_vehicle(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = state.fleet.create_vehicle(request, &caller).await?;
    Ok(Json(VehicleResponse::from_vehicle(
        vehicle,
        &state.config.public_base_url,
    )))
}

async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = state.fleet.set_status(id, request.status, &caller).await?;
    Ok(Json(VehicleResponse::from_vehicle(
        vehicle,
        &state.config.public_base_url,
    )))
}

async fn update_battery(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBatteryRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = state.fleet.update_battery(id, request.battery, &caller).await?;
    Ok(Json(VehicleResponse::from_vehicle(
        vehicle,
        &state.config.public_base_url,
    )))
}
