//! Chat routes: streaming and buffered simulation-config generation.

use std::pin::Pin;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::state::AppState;
use gist_chat::relay::{build_request, buffered_relay, stream_relay};
use gist_chat::types::*;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, axum::Error>> + Send>>;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(stream_chat))
}

fn no_messages() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "No messages provided" })),
    )
        .into_response()
}

// ---------------------------------------------------------------
// Streaming chat (SSE)
// ---------------------------------------------------------------

async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.messages.is_empty() {
        return no_messages();
    }

    let options = state.stream_options(req.model, req.max_tokens);
    debug!(
        "Streaming {} messages to {}",
        req.messages.len(),
        options.model
    );
    let request = build_request(&req.messages, state.stream_bundle(), &options);

    let events: SseStream = Box::pin(
        stream_relay(state.provider.clone(), request)
            .map(|envelope| Event::default().json_data(&envelope)),
    );

    (
        [(X_ACCEL_BUFFERING, HeaderValue::from_static("no"))],
        Sse::new(events),
    )
        .into_response()
}

// ---------------------------------------------------------------
// Buffered chat
// ---------------------------------------------------------------

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    if req.messages.is_empty() {
        return no_messages();
    }

    let options = state.chat_options(req.model, req.max_tokens);
    let reply = buffered_relay(
        state.provider.as_ref(),
        &state.bundle,
        &req.messages,
        &options,
    )
    .await;

    if let ChatReply::Error { error } = &reply {
        warn!("Chat generation failed: {}", error);
    }
    Json(reply).into_response()
}
