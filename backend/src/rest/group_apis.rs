//! # REST API for Group Management
//!
//! Create/update responses carry both the stored group and any requested
//! member ids that were rejected, so clients see exactly what survived
//! validation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{CreateGroupRequest, UpdateGroupRequest};

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_groups(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/groups - user: {}", principal.user_id);

    match state.group_service.list_groups(&principal) {
        Ok(groups) => (StatusCode::OK, Json(groups)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn create_group(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    info!("POST /api/groups - request: {:?}", request);

    match state.group_service.create_group(&principal, request) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/groups/{}", group_id);

    match state.group_service.get_group(&principal, &group_id) {
        Ok(group) => (StatusCode::OK, Json(group)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn update_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<String>,
    Json(request): Json<UpdateGroupRequest>,
) -> impl IntoResponse {
    info!("PUT /api/groups/{} - request: {:?}", group_id, request);

    match state
        .group_service
        .update_group(&principal, &group_id, request)
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/groups/{}", group_id);

    match state.group_service.delete_group(&principal, &group_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}
