//! Request/response DTOs for POST /chat.

use git_block_engine::BlockRef;
use serde::{Deserialize, Serialize};

/// A question about one block of code.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub block_ref: BlockRef,
    pub question: String,
    /// Continues an existing conversation when present and still live.
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Echoed (or freshly created) session id for follow-up questions.
    pub session_id: String,
}

/// Response for the session-less prefix-cached path.
#[derive(Debug, Serialize)]
pub struct CachedChatResponse {
    pub answer: String,
}
