/// PixelBot endpoints (public)
///
/// - `POST /api/chat/ai` - `{ messages: [{ role, content }] }` -> `{ success, reply }`
/// - `POST /api/chat/search` - `{ query }` -> `{ success, results: [{ file, snippet }] }`

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pixelscribe_shared::{
    search::SearchHit,
    vendor::openai::{ChatError, ChatMessage},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

/// Search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchHit>,
}

/// Produces PixelBot's next reply
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    // A missing or unreadable body is an empty conversation
    let messages = body.map(|Json(req)| req.messages).unwrap_or_default();
    if messages.is_empty() {
        return Err(ChatError::NoMessages.into());
    }

    let reply = state.chat.reply(&messages).await.map_err(|err| {
        tracing::warn!(error = %err, "Chat reply failed");
        ApiError::from(err)
    })?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}

/// Looks up text in the startup document index
pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let query = body.map(|Json(req)| req.query).unwrap_or_default();
    let results = state.docs.search(&query)?;

    Ok(Json(SearchResponse {
        success: true,
        results,
    }))
}
