//!
//! tasknote HTTP server
//! --------------------
//! Axum-based HTTP/JSON API for the task/note backend.
//!
//! Responsibilities:
//! - Registration and login endpoints backed by the credential store.
//! - Bearer-token middleware that resolves the caller's identity once per
//!   request and hands it to handlers as a `CurrentUser` extension.
//! - Owner-scoped CRUD endpoints for tasks and notes, plus note↔task
//!   linking, delegating to the resource store.
//!
//! The token travels in the `x-access-token` header as the raw signed
//! string. That header name and the response message strings are protocol
//! details existing clients depend on.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Config;
use crate::db::SharedDb;
use crate::error::{ApiError, ApiResult};
use crate::security;
use crate::storage::{notes, tasks, Note, NotePatch, Task, TaskPatch};
use crate::token::TokenService;

/// Header carrying the raw signed token. No `Bearer` prefix.
pub const TOKEN_HEADER: &str = "x-access-token";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub tokens: TokenService,
}

/// Identity resolved by the auth middleware, passed to protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Opens the store and serves the API until the process is stopped.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let db = SharedDb::open(&config.db_path)?;
    let state = AppState {
        db,
        tokens: TokenService::new(&config.secret_key, config.token_ttl_secs),
    };
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Mounts all routes. Public routes first, then the protected group behind
/// the token middleware.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/{task_id}", put(update_task).delete(delete_task))
        .route("/notes", post(create_note).get(list_notes))
        .route("/notes/{id}", put(update_note).delete(delete_note))
        .route("/tasks/{task_id}/notes", get(list_notes_for_task))
        .route("/tasks/{task_id}/notes/{note_id}", put(link_note_to_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

/// Auth middleware: validates the bearer token, cross-checks the embedded
/// user id against the credential store, and stashes the identity in the
/// request extensions. A token for a vanished user is as invalid as a bad
/// signature.
async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req.headers().get(TOKEN_HEADER).ok_or(ApiError::TokenMissing)?;
    let token = header.to_str().map_err(|_| ApiError::TokenInvalid)?.to_string();
    let user_id = state.tokens.validate(&token)?;

    let user = {
        let conn = state.db.0.lock();
        security::find_user(&conn, user_id)?
    };
    let Some(user) = user else {
        return Err(ApiError::TokenInvalid);
    };

    req.extensions_mut().insert(CurrentUser { id: user.id, username: user.username });
    Ok(next.run(req).await)
}

// Body extraction failures (absent body, bad JSON, wrong types) become
// explicit 400s instead of the framework default.
fn parse_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::validation(rejection.body_text())),
    }
}

fn required_field(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::validation(format!("{name} is required"))),
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsPayload {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskPayload {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateTaskPayload {
    title: Option<String>,
    completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CreateNotePayload {
    content: Option<String>,
    task_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateNotePayload {
    content: Option<String>,
    /// `None` = field absent (keep), `Some(None)` = explicit null (clear).
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    task_id: Option<Option<i64>>,
}

fn deserialize_explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = parse_body(payload)?;
    let username = required_field(payload.username, "username")?;
    let password = required_field(payload.password, "password")?;

    {
        let conn = state.db.0.lock();
        security::register(&conn, &username, &password)?;
    }
    info!(target: "tasknote::auth", "registered user '{}'", username);
    Ok((StatusCode::CREATED, Json(json!({ "message": "User registered successfully" }))))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let payload = parse_body(payload)?;
    let username = required_field(payload.username, "username")?;
    let password = required_field(payload.password, "password")?;

    let user_id = {
        let conn = state.db.0.lock();
        security::authenticate(&conn, &username, &password)?
    };
    let token = state.tokens.issue(user_id)?;
    Ok(Json(json!({ "token": token })))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateTaskPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = parse_body(payload)?;
    let title = required_field(payload.title, "title")?;

    let task = {
        let conn = state.db.0.lock();
        tasks::create(&conn, user.id, &title)?
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": "Task created", "task": task }))))
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = {
        let conn = state.db.0.lock();
        tasks::list_by_owner(&conn, user.id)?
    };
    Ok(Json(tasks))
}

async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTaskPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let payload = parse_body(payload)?;
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
    }

    let task = {
        let conn = state.db.0.lock();
        tasks::update(
            &conn,
            user.id,
            id,
            &TaskPatch { title: payload.title, completed: payload.completed },
        )?
    };
    Ok(Json(json!({ "message": "Task updated", "task": task })))
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    {
        let conn = state.db.0.lock();
        tasks::delete(&conn, user.id, id)?;
    }
    Ok(Json(json!({ "message": "Task deleted" })))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateNotePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = parse_body(payload)?;
    let content = required_field(payload.content, "content")?;

    let note = {
        let conn = state.db.0.lock();
        notes::create(&conn, user.id, &content, payload.task_id)?
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": "Note created", "note": note }))))
}

async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Note>>> {
    let notes = {
        let conn = state.db.0.lock();
        notes::list_by_owner(&conn, user.id)?
    };
    Ok(Json(notes))
}

async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateNotePayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let payload = parse_body(payload)?;
    if let Some(content) = &payload.content {
        if content.trim().is_empty() {
            return Err(ApiError::validation("content must not be empty"));
        }
    }

    let note = {
        let conn = state.db.0.lock();
        notes::update(
            &conn,
            user.id,
            id,
            &NotePatch { content: payload.content, task_id: payload.task_id },
        )?
    };
    Ok(Json(json!({ "message": "Note updated", "note": note })))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    {
        let conn = state.db.0.lock();
        notes::delete(&conn, user.id, id)?;
    }
    Ok(Json(json!({ "message": "Note deleted" })))
}

async fn list_notes_for_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Vec<Note>>> {
    let notes = {
        let conn = state.db.0.lock();
        notes::list_for_task(&conn, user.id, task_id)?
    };
    Ok(Json(notes))
}

async fn link_note_to_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((task_id, note_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    let note = {
        let conn = state.db.0.lock();
        notes::link_to_task(&conn, user.id, task_id, note_id)?
    };
    Ok(Json(json!({ "message": "Note linked to task", "note": note })))
}
