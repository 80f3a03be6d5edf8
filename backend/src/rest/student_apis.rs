//! # REST API for Student Management
//!
//! CRUD over students plus the derived per-student views (attendance
//! statistics and the payment summary).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{CreateStudentRequest, UpdateStudentRequest};

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_students(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/students - user: {}", principal.user_id);

    match state.student_service.list_students(&principal) {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn create_student(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students - request: {:?}", request);

    match state.student_service.create_student(&principal, request) {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}", student_id);

    match state.student_service.get_student(&principal, &student_id) {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn update_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{} - request: {:?}", student_id, request);

    match state
        .student_service
        .update_student(&principal, &student_id, request)
    {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}", student_id);

    match state.student_service.delete_student(&principal, &student_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Attendance history and counters over the student's realized sessions
pub async fn get_student_attendance(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/attendance", student_id);

    match state
        .reconciliation_service
        .attendance(&principal, &student_id)
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Balance view, recomputed from sessions and payments on every call
pub async fn get_student_payment_summary(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/payment-summary", student_id);

    match state
        .reconciliation_service
        .payment_summary(&principal, &student_id)
    {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => domain_error_response(e),
    }
}
