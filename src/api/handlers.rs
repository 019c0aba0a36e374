//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{ChatRequest, ErrorResponse, SessionResponse, SubmitResponse, SuccessResponse};
use super::AppState;
use crate::runtime::{ChatHandle, SseEvent, SubmitError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the chat display
        .route("/", get(serve_spa))
        // Static assets embedded from ui/dist
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/close", post(close_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/quick/:index", post(quick_reply))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Display Handler
// ============================================================

/// Serve index.html for the chat display
async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let handle = state.runtime.create_session().await;
    Json(SessionResponse::new(
        handle.session_id(),
        handle.current_state(),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    Ok(Json(SessionResponse::new(id, handle.current_state())))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.runtime.close(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = lookup(&state, &id).await?;

    // Subscribe before taking the snapshot so nothing falls in between;
    // the display drops duplicates by message id.
    let broadcast_rx = handle.subscribe();
    let snapshot = handle.current_state();

    let init_event = SseEvent::Init {
        messages: snapshot.messages,
        busy: snapshot.busy,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let Json(req) = payload?;
    let handle = lookup(&state, &id).await?;
    submit_outcome(handle.submit(req.text).await)
}

async fn quick_reply(
    State(state): State<AppState>,
    path: Result<Path<(String, usize)>, PathRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let Path((id, index)) = path?;
    let handle = lookup(&state, &id).await?;
    submit_outcome(handle.quick_reply(index).await)
}

/// Ignored submissions are a normal outcome, not an HTTP error
fn submit_outcome(result: Result<(), SubmitError>) -> Result<Json<SubmitResponse>, AppError> {
    match result {
        Ok(()) => Ok(Json(SubmitResponse {
            accepted: true,
            reason: None,
        })),
        Err(SubmitError::Rejected(e)) => Ok(Json(SubmitResponse {
            accepted: false,
            reason: Some(e.to_string()),
        })),
        Err(e @ SubmitError::UnknownQuickReply(_)) => Err(AppError::BadRequest(e.to_string())),
        Err(e @ SubmitError::RuntimeStopped) => Err(AppError::Internal(e.to_string())),
    }
}

async fn get_version() -> &'static str {
    concat!("finmate ", env!("CARGO_PKG_VERSION"))
}

async fn lookup(state: &AppState, id: &str) -> Result<ChatHandle, AppError> {
    state
        .runtime
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
