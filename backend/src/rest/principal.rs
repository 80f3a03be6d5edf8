//! Bearer-token extraction: turns the Authorization header into a verified
//! [`Principal`] before any protected handler runs.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::Principal;
use crate::rest::{auth_error_response, error_body};
use crate::AppState;

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                error_body("Missing or malformed authorization header"),
            )
                .into_response());
        };

        state
            .auth_service
            .verify_token(token)
            .map_err(auth_error_response)
    }
}
