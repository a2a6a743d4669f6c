//! Shared helpers for driving the full router in-process.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use tasknote::db::SharedDb;
use tasknote::server::{router, AppState, TOKEN_HEADER};
use tasknote::token::TokenService;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_TTL_SECS: i64 = 3600;

pub fn test_app() -> Router {
    let db = SharedDb::open_in_memory().expect("in-memory db");
    let state = AppState {
        db,
        tokens: TokenService::new(TEST_SECRET, TEST_TTL_SECS),
    };
    router(state)
}

/// Fires one request at the app and returns status plus parsed JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Registers a fresh user and returns a valid bearer token for it.
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration for {username}");

    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login for {username}");
    body["token"].as_str().expect("token in login response").to_string()
}
