use axum::{
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};

use crate::dto::auth_dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::models::Caller;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.register(request).await?;
    Ok(Json(UserResponse::from(user)))
}

async fn login(
    State(state): State<AppState>,
    Form(request): Form<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let session = state.users.login(&request.username, &request.password).await?;
    Ok(Json(TokenResponse::bearer(
        session.access_token,
        session.expires_in,
        &session.user,
    )))
}

async fn me(State(state): State<AppState>, caller: Caller) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.me(&caller).await?;
    Ok(Json(UserResponse::from(user)))
}
