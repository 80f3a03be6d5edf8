//! # REST API for Recurring Templates
//!
//! Template CRUD plus occurrence logging: `POST .../occurrences` snapshots
//! the participant roster and persists one dated realized session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{CreateFixedSessionRequest, LogOccurrenceRequest, UpdateFixedSessionRequest};

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_fixed_sessions(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/fixed-sessions - user: {}", principal.user_id);

    match state.scheduling_service.list_templates(&principal) {
        Ok(templates) => (StatusCode::OK, Json(templates)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn create_fixed_session(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateFixedSessionRequest>,
) -> impl IntoResponse {
    info!("POST /api/fixed-sessions - request: {:?}", request);

    match state.scheduling_service.create_template(&principal, request) {
        Ok(template) => (StatusCode::CREATED, Json(template)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_fixed_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(fixed_session_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/fixed-sessions/{}", fixed_session_id);

    match state
        .scheduling_service
        .get_template(&principal, &fixed_session_id)
    {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn update_fixed_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(fixed_session_id): Path<String>,
    Json(request): Json<UpdateFixedSessionRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/fixed-sessions/{} - request: {:?}",
        fixed_session_id, request
    );

    match state
        .scheduling_service
        .update_template(&principal, &fixed_session_id, request)
    {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_fixed_session(
    State(state): State<AppState>,
    principal: Principal,
    Path(fixed_session_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/fixed-sessions/{}", fixed_session_id);

    match state
        .scheduling_service
        .delete_template(&principal, &fixed_session_id)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Log one dated occurrence of the template
pub async fn log_occurrence(
    State(state): State<AppState>,
    principal: Principal,
    Path(fixed_session_id): Path<String>,
    Json(request): Json<LogOccurrenceRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/fixed-sessions/{}/occurrences - request: {:?}",
        fixed_session_id, request
    );

    match state
        .scheduling_service
        .log_occurrence(&principal, &fixed_session_id, request)
    {
        Ok(occurrence) => (StatusCode::CREATED, Json(occurrence)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Occurrences of the template, most recent date first
pub async fn list_occurrences(
    State(state): State<AppState>,
    principal: Principal,
    Path(fixed_session_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/fixed-sessions/{}/occurrences", fixed_session_id);

    match state
        .scheduling_service
        .list_occurrences(&principal, &fixed_session_id)
    {
        Ok(occurrences) => (StatusCode::OK, Json(occurrences)).into_response(),
        Err(e) => domain_error_response(e),
    }
}
