//! POST /chat — answers a question about a block of code.

use axum::{Json, extract::State};
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::{CachedChatResponse, ChatRequest, ChatResponse},
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -d '{"block_ref":{"repo_owner":"acme","repo_name":"widgets","ref":"main","path":"a.py","start_line":10,"end_line":12},"question":"Why was this changed?"}'
/// ```
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if body.question.trim().is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    info!(
        repo = %format!("{}/{}", body.block_ref.repo_owner, body.block_ref.repo_name),
        path = %body.block_ref.path,
        lines = %format!("{}-{}", body.block_ref.start_line, body.block_ref.end_line),
        "chat request"
    );

    let (answer, session_id) = state
        .agent
        .answer_question(&body.block_ref, &body.question, body.session_id.as_deref())
        .await?;

    Ok(Json(ChatResponse { answer, session_id }))
}

/// Handler: POST /chat/cached
///
/// Single-shot answering over the precomputed code+history prefix. No tools
/// and no session state; repeated questions about the same block reuse the
/// cached rendering. `session_id` in the body is ignored.
pub async fn chat_cached(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<CachedChatResponse>> {
    if body.question.trim().is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    info!(
        repo = %format!("{}/{}", body.block_ref.repo_owner, body.block_ref.repo_name),
        path = %body.block_ref.path,
        lines = %format!("{}-{}", body.block_ref.start_line, body.block_ref.end_line),
        "cached chat request"
    );

    let answer = state
        .agent
        .answer_with_prefix_cache(&body.block_ref, &body.question)
        .await?;

    Ok(Json(CachedChatResponse { answer }))
}
