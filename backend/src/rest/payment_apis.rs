//! # REST API for Payments
//!
//! Payment CRUD, the dedicated mark-paid operation, and the all-students
//! balance rollup for the teacher's dashboard.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use log::info;

use shared::{CreatePaymentRequest, MarkPaidRequest, UpdatePaymentRequest};

use crate::domain::Principal;
use crate::rest::domain_error_response;
use crate::AppState;

pub async fn list_payments(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/payments - user: {}", principal.user_id);

    match state.payment_service.list_payments(&principal) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn create_payment(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    info!("POST /api/payments - request: {:?}", request);

    match state.payment_service.create_payment(&principal, request) {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/payments/{}", payment_id);

    match state.payment_service.get_payment(&principal, &payment_id) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Payments recorded for one student, most recent first
pub async fn list_payments_for_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/payments/student/{}", student_id);

    match state
        .payment_service
        .list_payments_for_student(&principal, &student_id)
    {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn update_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<String>,
    Json(request): Json<UpdatePaymentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/payments/{} - request: {:?}", payment_id, request);

    match state
        .payment_service
        .update_payment(&principal, &payment_id, request)
    {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Mark the payment completed, stamping its paid date
pub async fn mark_paid(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<String>,
    Json(request): Json<MarkPaidRequest>,
) -> impl IntoResponse {
    info!("POST /api/payments/{}/mark-paid", payment_id);

    match state
        .payment_service
        .mark_paid(&principal, &payment_id, request)
    {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

pub async fn delete_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/payments/{}", payment_id);

    match state.payment_service.delete_payment(&principal, &payment_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Balance views for every student, teacher only
pub async fn list_payment_summaries(
    State(state): State<AppState>,
    principal: Principal,
) -> impl IntoResponse {
    info!("GET /api/payment-summaries - user: {}", principal.user_id);

    match state.reconciliation_service.all_payment_summaries(&principal) {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(e) => domain_error_response(e),
    }
}
