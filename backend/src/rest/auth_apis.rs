//! # REST API for Accounts
//!
//! Registration, login, and the current-user lookup. These are the only
//! routes reachable without a bearer token (apart from `/auth/me`, which
//! requires one by definition).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{LoginRequest, RegisterRequest};

use crate::domain::Principal;
use crate::rest::auth_error_response;
use crate::AppState;

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/register - email: {}", request.email);

    match state.auth_service.register(request) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => auth_error_response(e),
    }
}

/// Verify credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - email: {}", request.email);

    match state.auth_service.login(request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => auth_error_response(e),
    }
}

/// Current user behind the presented token
pub async fn me(State(state): State<AppState>, principal: Principal) -> impl IntoResponse {
    info!("GET /api/auth/me - user: {}", principal.user_id);

    match state.auth_service.current_user(&principal) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => auth_error_response(e),
    }
}
