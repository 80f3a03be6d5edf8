//! # Tutoring Tracker Backend
//!
//! A small tutoring-management server: a teacher manages students, groups,
//! one-off sessions, weekly recurring templates and their realized
//! occurrences, and payments; parents get read access scoped to their own
//! children. Persistence is a flat JSON-file store under a data directory.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! REST layer (axum handlers, token extraction, error mapping)
//!     ↓
//! Domain layer (services, validation, role-based visibility)
//!     ↓
//! Storage layer (repository traits over JSON-file collections)
//! ```

pub mod domain;
pub mod rest;
pub mod storage;

use anyhow::Result;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::{
    AuthService, GroupService, PaymentService, ReconciliationService, SchedulingService,
    SessionService, StudentService,
};
use crate::storage::JsonConnection;

/// Runtime configuration, read from the environment with local-use defaults
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("TUTORING_TRACKER_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3000);

        let data_dir = match std::env::var("TUTORING_TRACKER_DATA_DIR") {
            Ok(dir) => {
                info!("Using data directory from environment: {}", dir);
                PathBuf::from(dir)
            }
            Err(_) => PathBuf::from("data"),
        };

        let jwt_secret = match std::env::var("TUTORING_TRACKER_JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                warn!("TUTORING_TRACKER_JWT_SECRET not set, using an insecure default");
                "insecure-dev-secret".to_string()
            }
        };

        Self {
            port,
            data_dir,
            jwt_secret,
        }
    }
}

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService<JsonConnection>,
    pub student_service: StudentService<JsonConnection>,
    pub group_service: GroupService<JsonConnection>,
    pub session_service: SessionService<JsonConnection>,
    pub payment_service: PaymentService<JsonConnection>,
    pub scheduling_service: SchedulingService<JsonConnection>,
    pub reconciliation_service: ReconciliationService<JsonConnection>,
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up storage in {}", config.data_dir.display());
    let connection = Arc::new(JsonConnection::new(&config.data_dir)?);

    info!("Setting up domain services");
    Ok(AppState {
        auth_service: AuthService::new(connection.clone(), config.jwt_secret.clone()),
        student_service: StudentService::new(connection.clone()),
        group_service: GroupService::new(connection.clone()),
        session_service: SessionService::new(connection.clone()),
        payment_service: PaymentService::new(connection.clone()),
        scheduling_service: SchedulingService::new(connection.clone()),
        reconciliation_service: ReconciliationService::new(connection),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow browser clients to make requests
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/auth/register", axum::routing::post(rest::auth_apis::register))
        .route("/auth/login", axum::routing::post(rest::auth_apis::login))
        .route("/auth/me", get(rest::auth_apis::me))
        .route(
            "/students",
            get(rest::student_apis::list_students).post(rest::student_apis::create_student),
        )
        .route(
            "/students/:student_id",
            get(rest::student_apis::get_student)
                .put(rest::student_apis::update_student)
                .delete(rest::student_apis::delete_student),
        )
        .route(
            "/students/:student_id/attendance",
            get(rest::student_apis::get_student_attendance),
        )
        .route(
            "/students/:student_id/payment-summary",
            get(rest::student_apis::get_student_payment_summary),
        )
        .route(
            "/groups",
            get(rest::group_apis::list_groups).post(rest::group_apis::create_group),
        )
        .route(
            "/groups/:group_id",
            get(rest::group_apis::get_group)
                .put(rest::group_apis::update_group)
                .delete(rest::group_apis::delete_group),
        )
        .route(
            "/sessions",
            get(rest::session_apis::list_sessions).post(rest::session_apis::create_session),
        )
        .route(
            "/sessions/student/:student_id",
            get(rest::session_apis::list_sessions_for_student),
        )
        .route(
            "/sessions/:session_id",
            get(rest::session_apis::get_session)
                .put(rest::session_apis::update_session)
                .delete(rest::session_apis::delete_session),
        )
        .route(
            "/fixed-sessions",
            get(rest::fixed_session_apis::list_fixed_sessions)
                .post(rest::fixed_session_apis::create_fixed_session),
        )
        .route(
            "/fixed-sessions/:fixed_session_id",
            get(rest::fixed_session_apis::get_fixed_session)
                .put(rest::fixed_session_apis::update_fixed_session)
                .delete(rest::fixed_session_apis::delete_fixed_session),
        )
        .route(
            "/fixed-sessions/:fixed_session_id/occurrences",
            get(rest::fixed_session_apis::list_occurrences)
                .post(rest::fixed_session_apis::log_occurrence),
        )
        .route(
            "/realized-sessions",
            get(rest::realized_session_apis::list_realized_sessions),
        )
        .route(
            "/realized-sessions/:realized_session_id",
            get(rest::realized_session_apis::get_realized_session)
                .delete(rest::realized_session_apis::delete_realized_session),
        )
        .route(
            "/realized-sessions/:realized_session_id/attendance/:student_id",
            axum::routing::put(rest::realized_session_apis::set_attendance),
        )
        .route(
            "/payments",
            get(rest::payment_apis::list_payments).post(rest::payment_apis::create_payment),
        )
        .route(
            "/payments/student/:student_id",
            get(rest::payment_apis::list_payments_for_student),
        )
        .route(
            "/payments/:payment_id",
            get(rest::payment_apis::get_payment)
                .put(rest::payment_apis::update_payment)
                .delete(rest::payment_apis::delete_payment),
        )
        .route(
            "/payments/:payment_id/mark-paid",
            axum::routing::post(rest::payment_apis::mark_paid),
        )
        .route(
            "/payment-summaries",
            get(rest::payment_apis::list_payment_summaries),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
