//! # REST Layer
//!
//! Axum handlers over the domain services. Every protected handler takes a
//! [`Principal`](crate::domain::Principal) extracted from the bearer token;
//! errors map onto status codes here and nowhere else. Store failures are
//! logged server-side and leave only a generic message in the response.

pub mod auth_apis;
pub mod fixed_session_apis;
pub mod group_apis;
pub mod payment_apis;
pub mod principal;
pub mod realized_session_apis;
pub mod session_apis;
pub mod student_apis;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use log::error;
use serde::Serialize;

use crate::domain::{AuthError, DomainError};

/// Structured failure body every error response carries
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_body(message: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: message.into(),
    })
}

/// Map a domain error onto its status code. Validation 400, authorization
/// 403, not-found 404; storage failures 500 with no internal detail.
pub(crate) fn domain_error_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(message) => {
            (StatusCode::BAD_REQUEST, error_body(message)).into_response()
        }
        DomainError::NotFound(message) => {
            (StatusCode::NOT_FOUND, error_body(message)).into_response()
        }
        DomainError::Authorization(message) => {
            (StatusCode::FORBIDDEN, error_body(message)).into_response()
        }
        DomainError::Store(source) => {
            error!("Store error: {:#}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal server error"),
            )
                .into_response()
        }
    }
}

pub(crate) fn auth_error_response(err: AuthError) -> Response {
    match err {
        AuthError::EmailTaken => (StatusCode::CONFLICT, error_body(err.to_string())).into_response(),
        AuthError::InvalidCredentials | AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, error_body(err.to_string())).into_response()
        }
        AuthError::Validation(message) => {
            (StatusCode::BAD_REQUEST, error_body(message)).into_response()
        }
        AuthError::Store(source) => {
            error!("Store error: {:#}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal server error"),
            )
                .into_response()
        }
    }
}
