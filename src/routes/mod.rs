//! Rutas HTTP
//!
//! `create_router` monta todas las rutas sobre el estado compartido con
//! trazas de peticiones y CORS.

pub mod order_routes;
pub mod user_routes;
pub mod vehicle_routes;
pub mod ws_routes;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .merge(vehicle_routes::create_vehicle_router())
        .merge(order_routes::create_order_router())
        .nest("/users", user_routes::create_user_router())
        .merge(ws_routes::create_ws_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "observers": state.registry.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
