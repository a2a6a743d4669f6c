//! Registration, login, and bearer-token enforcement over the HTTP surface.

mod common;

use axum::http::StatusCode;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use common::{register_and_login, send, test_app, TEST_SECRET, TEST_TTL_SECS};
use tasknote::token::{Claims, TokenService};

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "alice", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn registration_requires_both_fields() {
    let app = test_app();

    let (status, _) =
        send(&app, "POST", "/register", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No body at all is a validation failure too, not a framework error.
    let (status, _) = send(&app, "POST", "/register", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = test_app();
    register_and_login(&app, "alice", "pw1").await;

    let (wrong_pw_status, wrong_pw_body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "mallory", "password": "pw1" })),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    // Identical outcome, no username enumeration.
    assert_eq!(wrong_pw_body, unknown_body);
    assert_eq!(wrong_pw_body["message"], "Invalid username or password");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_tokens() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is missing!");

    let (status, body) = send(&app, "GET", "/tasks", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is invalid!");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = test_app();
    register_and_login(&app, "alice", "pw1").await;

    // Same secret and claim shape, but issued two TTLs ago.
    let iat = chrono::Utc::now().timestamp() - 2 * TEST_TTL_SECS;
    let claims = Claims { user_id: 1, iat, exp: iat + TEST_TTL_SECS };
    let stale = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encode stale token");

    let (status, body) = send(&app, "GET", "/tasks", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is invalid!");
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let app = test_app();

    // Well-formed and unexpired, but the identity resolves to nothing.
    let orphan = TokenService::new(TEST_SECRET, TEST_TTL_SECS)
        .issue(9999)
        .expect("issue token");
    let (status, body) = send(&app, "GET", "/tasks", Some(&orphan), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is invalid!");
}
