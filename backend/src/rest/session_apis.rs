//! # REST API for One-off Sessions

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{CreateSessionRequest, UpdateSessionRequest};

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_sessions(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/sessions - user: {}", principal.user_id);

    match state.session_service.list_sessions(&principal) {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn create_session(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    info!("POST /api/sessions - request: {:?}", request);

    match state.session_service.create_session(&principal, request) {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/sessions/{}", session_id);

    match state.session_service.get_session(&principal, &session_id) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Individual sessions held for one student, most recent first
pub async fn list_sessions_for_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/sessions/student/{}", student_id);

    match state
        .session_service
        .list_sessions_for_student(&principal, &student_id)
    {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn update_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> impl IntoResponse {
    info!("PUT /api/sessions/{} - request: {:?}", session_id, request);

    match state
        .session_service
        .update_session(&principal, &session_id, request)
    {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/sessions/{}", session_id);

    match state.session_service.delete_session(&principal, &session_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}
