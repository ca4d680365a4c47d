//! JSON endpoints driving wizard sessions.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;

use super::model::BusinessForm;
use super::session::WizardSessions;
use crate::error::{Error, WizardError};

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub sessions: Arc<WizardSessions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartQuery {
    start_step: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    item: String,
}

/// Map a wizard failure onto an HTTP status and JSON body.
pub fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::Wizard(WizardError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
        Error::Wizard(WizardError::InvalidStartStep(_)) => StatusCode::BAD_REQUEST,
        Error::Validation(v) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"error": err.to_string(), "fields": v.fields})),
            )
                .into_response();
        }
        Error::Wizard(_) => StatusCode::CONFLICT,
        Error::Config(_) | Error::Store(_) | Error::Api(_) => {
            warn!(error = %err, "Wizard request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

fn parse_session_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| bad_request("Invalid session ID"))
}

fn respond<T: serde::Serialize>(result: Result<T, Error>, created: bool) -> Response {
    match result {
        Ok(body) if created => (StatusCode::CREATED, Json(body)).into_response(),
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/wizard?startStep=N
async fn start_session(
    State(state): State<WizardRouteState>,
    Query(query): Query<StartQuery>,
) -> Response {
    let start_step = query.start_step.unwrap_or(1);
    respond(state.sessions.start(start_step).await, true)
}

/// GET /api/wizard/{id}
async fn get_session(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.sessions.snapshot(id).await, false)
}

/// POST /api/wizard/{id}/toggle
async fn toggle_item(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.sessions.toggle(id, &body.item).await, false)
}

/// POST /api/wizard/{id}/next
///
/// The body is the business form on step 1 and empty otherwise.
async fn next_step(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let form = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<BusinessForm>(&body) {
            Ok(form) => Some(form),
            Err(e) => return bad_request(&format!("Invalid business form: {e}")),
        }
    };
    respond(state.sessions.confirm(id, form).await, false)
}

/// POST /api/wizard/{id}/back
async fn previous_step(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.sessions.back(id).await, false)
}

/// POST /api/wizard/{id}/regenerate
async fn regenerate(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(state.sessions.regenerate(id).await, false)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Build the wizard JSON API.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/wizard", post(start_session))
        .route("/api/wizard/{id}", get(get_session))
        .route("/api/wizard/{id}/toggle", post(toggle_item))
        .route("/api/wizard/{id}/next", post(next_step))
        .route("/api/wizard/{id}/back", post(previous_step))
        .route("/api/wizard/{id}/regenerate", post(regenerate))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
