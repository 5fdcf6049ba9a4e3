//! HTTP endpoints: message intake and liveness.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::auth::{AuthPolicy, verify_request};
use super::commands::APOLOGY_TEXT;
use super::handler::{BotReply, IntakeHandler};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: IntakeHandler,
    pub auth: AuthPolicy,
}

/// Build the Axum router with the intake and health routes.
pub fn intake_routes(handler: IntakeHandler, auth: AuthPolicy) -> Router {
    let state = AppState { handler, auth };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/messages", post(messages))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Support Chatbot is running!"
    }))
}

// ── Messages ────────────────────────────────────────────────────────────

/// Always answers 200 with a bot reply, unless verification rejects the caller.
///
/// A body axum refuses to buffer (over the size limit, aborted upload) gets
/// the apology like any other failure.
async fn messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if let Err(e) = verify_request(&headers, state.auth) {
        warn!(error = %e, "Failed to verify inbound request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(status = %e.status(), error = %e.body_text(), "Failed to read message body");
            return Json(BotReply::message(APOLOGY_TEXT)).into_response();
        }
    };

    info!(bytes = body.len(), "Received message");
    Json(state.handler.handle_payload(&body)).into_response()
}
