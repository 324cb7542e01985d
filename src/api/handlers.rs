//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{AcceptedResponse, Activity, ErrorResponse, StatusResponse};
use super::AppState;
use crate::state_machine::Event;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound activities from the messaging transport
        .route("/api/messages", post(receive_activity))
        .route("/api/status", get(get_status))
        // Live feed of state changes and delivered replies
        .route("/api/events", get(stream_events))
        .route("/version", get(get_version))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Inbound Activities
// ============================================================

async fn receive_activity(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    if !activity.is_message() {
        tracing::debug!(activity_type = %activity.activity_type, "Ignoring non-message activity");
        return Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { queued: false })));
    }

    let event = Event::UserMessage {
        text: activity.text.clone().unwrap_or_default(),
        from_name: activity.sender_name().to_string(),
        reference: activity.conversation_reference(),
        received_at: Utc::now(),
    };

    state
        .runtime
        .send_event(event)
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { queued: true })))
}

// ============================================================
// Status
// ============================================================

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.runtime.snapshot();
    Json(StatusResponse {
        phase: serde_json::to_value(&snapshot.state.phase).unwrap_or(Value::Null),
        session_active: snapshot.state.has_active_session(),
        next_count: snapshot.state.next_count,
        transcript_len: snapshot.transcript_len,
    })
}

async fn stream_events(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so nothing falls in between
    let broadcast_rx = state.runtime.subscribe();
    sse_stream(state.runtime.snapshot(), broadcast_rx)
}

async fn get_version() -> &'static str {
    concat!("live-assist-bridge ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
