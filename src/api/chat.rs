use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{AppState, ChatRequest};
use crate::models::ChatReply;
use crate::services::{CacheOutcome, ChatInput};

/// `POST /api/chat`
///
/// Replays a cached answer, stores a client-supplied `response`, or
/// generates a new answer, in that order of precedence. Every request gets
/// an answer; a blank query is cached under the bare `chat:` key.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> (Extension<CacheOutcome>, Json<ChatReply>) {
    let input = ChatInput {
        query: request.query,
        context: request.context,
        response: request.response,
        messages: request.messages,
    };

    let resolved = state.chat_service().chat(input).await;

    (Extension(resolved.outcome), Json(resolved.value))
}
