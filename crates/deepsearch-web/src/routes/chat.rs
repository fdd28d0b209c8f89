//! Chat API endpoint with SSE streaming

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::post;
use axum::Router;
use deepsearch_agents::conversation_to_messages;
use deepsearch_core::Message;
use futures::stream::Stream;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::services::spawn_relay;
use crate::state::AppState;
use crate::WebError;

/// Request body for a chat turn
///
/// Extra top-level fields (chat id, client metadata) are ignored.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Parse and validate a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, WebError> {
        let request: ChatRequest = serde_json::from_slice(body)
            .map_err(|e| WebError::BadRequest(format!("Invalid request body: {e}")))?;
        if request.messages.is_empty() {
            return Err(WebError::BadRequest("messages must not be empty".into()));
        }
        if conversation_to_messages(&request.messages).is_empty() {
            return Err(WebError::BadRequest("conversation has no content".into()));
        }
        Ok(request)
    }
}

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/api/chat", post(chat_handler))
}

/// Handle a chat turn and return its SSE stream
///
/// The caller is authenticated before the body is read.
async fn chat_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: Bytes,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, WebError> {
    let request = ChatRequest::parse(&body)?;
    info!(user_id = %user.id, messages = request.messages.len(), "Chat turn");

    let relay = spawn_relay(&state.orchestrator, request.messages, user.id, state.relay);
    Ok(Sse::new(relay.into_sse_stream()).keep_alive(KeepAlive::default()))
}
