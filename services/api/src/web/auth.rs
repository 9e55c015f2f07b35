//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{store_error_reply, ErrorReply, RoleDto, UserDto};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: RoleDto,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(serde::Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account.
///
/// Registration never starts a session; the caller must log in afterward.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Missing required fields", body = ErrorReply),
        (status = 409, description = "Email already registered", body = ErrorReply)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorReply>)> {
    let mut store = state.store.lock().await;
    let user_id = store
        .register(&req.name, &req.email, &req.password, req.role.into())
        .map_err(store_error_reply)?;

    let message = store.last_success().unwrap_or_default().to_string();
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, message })))
}

/// POST /auth/login - Authenticate and start the session.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserDto),
        (status = 400, description = "Missing required fields", body = ErrorReply),
        (status = 401, description = "Invalid credentials", body = ErrorReply)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorReply>)> {
    let mut store = state.store.lock().await;
    let user = store
        .login(&req.email, &req.password, req.remember_me)
        .await
        .map_err(store_error_reply)?;

    Ok((StatusCode::OK, Json(UserDto::from(user))))
}

/// POST /auth/logout - End the session and drop persisted credentials.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut store = state.store.lock().await;
    store.logout().await;
    StatusCode::OK
}
