//! # REST API for Realized Sessions
//!
//! Occurrences are created through the template routes; here they are
//! listed, inspected, deleted, and have per-participant attendance set.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::SetAttendanceRequest;

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_realized_sessions(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/realized-sessions - user: {}", principal.user_id);

    match state.scheduling_service.list_realized_sessions(&principal) {
        Ok(occurrences) => (StatusCode::OK, Json(occurrences)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_realized_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(realized_session_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/realized-sessions/{}", realized_session_id);

    match state
        .scheduling_service
        .get_realized_session(&principal, &realized_session_id)
    {
        Ok(occurrence) => (StatusCode::OK, Json(occurrence)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Set one roster member's presence; repeating the same value is a no-op
pub async fn set_attendance(
    State(state): State<AppState>,
    principal: Principal,
    Path((realized_session_id, student_id)): Path<(String, String)>,
    Json(request): Json<SetAttendanceRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/realized-sessions/{}/attendance/{} - present: {}",
        realized_session_id, student_id, request.present
    );

    match state.scheduling_service.set_attendance(
        &principal,
        &realized_session_id,
        &student_id,
        request.present,
    ) {
        Ok(occurrence) => (StatusCode::OK, Json(occurrence)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_realized_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(realized_session_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/realized-sessions/{}", realized_session_id);

    match state
        .scheduling_service
        .delete_realized_session(&principal, &realized_session_id)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}
