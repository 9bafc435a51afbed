use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::dto::order_dto::{OrderResponse, PageQuery, RentResponse, ReturnResponse};
use crate::models::Caller;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_order_router() -> Router<AppState> {
    Router::new()
        .route("/rent/:car_id", post(rent_vehicle))
        .route("/return/:order_id", post(return_vehicle))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
}

async fn rent_vehicle(
    State(state): State<AppState>,
    caller: Caller,
    Path(car_id): Path<i64>,
) -> Result<Json<RentResponse>, AppError> {
    let order = state.rentals.rent(car_id, &caller).await?;
    Ok(Json(RentResponse::from(&order)))
}

async fn return_vehicle(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<i64>,
) -> Result<Json<ReturnResponse>, AppError> {
    let order = state.rentals.return_vehicle(order_id, &caller).await?;
    Ok(Json(ReturnResponse::try_from(&order)?))
}

async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.rentals.list_orders(&caller, query.into()).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.rentals.get_order(id, &caller).await?;
    Ok(Json(OrderResponse::from(order)))
}
