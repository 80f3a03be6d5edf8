//! End-to-end tests over the assembled router: auth, role scoping, and the
//! core create/log/reconcile flow, driven through HTTP requests.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tutoring_tracker_backend::{create_router, initialize_backend, Config};

fn test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config {
        port: 0,
        data_dir: temp_dir.path().to_path_buf(),
        jwt_secret: "test-secret".to_string(),
    };
    let state = initialize_backend(&config).expect("Failed to initialize backend");
    (create_router(state), temp_dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response was not JSON")
    };
    (status, json)
}

/// Register an account and log in, returning the bearer token
async fn login_as(app: &Router, email: &str, role: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse",
            "name": "Test User",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": "correct horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token missing").to_string()
}

async fn create_student(app: &Router, token: &str, first: &str, parent_id: Option<&str>) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/students",
        Some(token),
        Some(json!({
            "first_name": first,
            "last_name": "Test",
            "hourly_rate": "25",
            "parent_id": parent_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("id missing").to_string()
}

#[tokio::test]
async fn test_requests_without_a_token_are_unauthorized() {
    let (app, _temp_dir) = test_app();

    let (status, body) = send(&app, Method::GET, "/api/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_register_login_me_round_trip() {
    let (app, _temp_dir) = test_app();
    let token = login_as(&app, "teacher@example.com", "teacher").await;

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "teacher@example.com");
    assert_eq!(body["role"], "teacher");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _temp_dir) = test_app();
    login_as(&app, "dup@example.com", "teacher").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "dup@example.com",
            "password": "correct horse",
            "name": "Again",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_group_creation_with_too_few_valid_members_is_rejected() {
    let (app, _temp_dir) = test_app();
    let token = login_as(&app, "teacher@example.com", "teacher").await;
    let s1 = create_student(&app, &token, "Ada", None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/groups",
        Some(&token),
        Some(json!({
            "name": "G1",
            "student_ids": [s1, "student::0::ghost"],
            "hourly_rate": "20",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/groups", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn test_recurring_flow_from_template_to_payment_summary() {
    let (app, _temp_dir) = test_app();
    let token = login_as(&app, "teacher@example.com", "teacher").await;
    let s1 = create_student(&app, &token, "Ada", None).await;

    // Weekly Monday slot
    let (status, template) = send(
        &app,
        Method::POST,
        "/api/fixed-sessions",
        Some(&token),
        Some(json!({
            "type": "individual",
            "student_id": s1,
            "day_of_week": "monday",
            "start_time": "14:00",
            "duration_minutes": 60,
            "price": "2500",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let template_id = template["id"].as_str().expect("id missing");

    // Log two occurrences, one with the student absent
    let (status, occurrence) = send(
        &app,
        Method::POST,
        &format!("/api/fixed-sessions/{}/occurrences", template_id),
        Some(&token),
        Some(json!({"date": "2024-09-02"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(occurrence["attendance"][0]["student_id"], s1.as_str());
    assert_eq!(occurrence["attendance"][0]["present"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/fixed-sessions/{}/occurrences", template_id),
        Some(&token),
        Some(json!({
            "date": "2024-09-09",
            "attendance_overrides": [{"student_id": s1, "present": false}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // One completed payment covering the first occurrence
    let occurrence_id = occurrence["id"].as_str().expect("id missing");
    let (status, payment) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "student_id": s1,
            "amount": "2500",
            "date": "2024-09-10",
            "session_ids": [occurrence_id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "pending");
    assert!(payment["paid_date"].is_null());

    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/api/payments/{}/mark-paid", payment["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "completed");
    assert!(paid["paid_date"].is_string());

    // Absent or not, both occurrences bill; one is settled
    let (status, summary) = send(
        &app,
        Method::GET,
        &format!("/api/students/{}/payment-summary", s1),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_owed"], "5000");
    assert_eq!(summary["total_paid"], "2500");
    assert_eq!(summary["remaining"], "2500");
    assert_eq!(summary["status"], "pending");
    assert_eq!(summary["unpaid_session_ids"].as_array().unwrap().len(), 1);

    let (status, attendance) = send(
        &app,
        Method::GET,
        &format!("/api/students/{}/attendance", s1),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attendance["stats"]["total_sessions"], 2);
    assert_eq!(attendance["stats"]["present_sessions"], 1);
    assert_eq!(attendance["stats"]["attendance_rate"], 50.0);
}

#[tokio::test]
async fn test_parent_visibility_and_write_denial() {
    let (app, _temp_dir) = test_app();
    let teacher_token = login_as(&app, "teacher@example.com", "teacher").await;
    let parent_token = login_as(&app, "parent@example.com", "parent").await;

    let (_, me) = send(&app, Method::GET, "/api/auth/me", Some(&parent_token), None).await;
    let parent_id = me["id"].as_str().expect("id missing").to_string();

    let mine = create_student(&app, &teacher_token, "Ada", Some(&parent_id)).await;
    let other = create_student(&app, &teacher_token, "Grace", None).await;

    // Parent sees only their linked child
    let (status, body) = send(&app, Method::GET, "/api/students", Some(&parent_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().expect("array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], mine.as_str());

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/students/{}", other),
        Some(&parent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Writes are teacher-only
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/students",
        Some(&parent_token),
        Some(json!({"first_name": "X", "last_name": "Y", "hourly_rate": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Teacher-only rollup
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/payment-summaries",
        Some(&parent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/payment-summaries",
        Some(&teacher_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 2);
}
