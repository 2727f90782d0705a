//! Provider services and the unified [`ChatClient`] dispatcher.

pub mod gemini_service;
pub mod open_ai_service;

use crate::{
    chat::{ChatMessage, ChatOutcome, ToolSpec},
    config::{LlmModelConfig, LlmProvider},
    error_handler::Result,
};

pub use gemini_service::GeminiService;
pub use open_ai_service::OpenAiService;

/// Provider-dispatching chat client.
///
/// Enum dispatch keeps call sites monomorphic and avoids boxing; adding a
/// provider means adding a variant here and a service module.
#[derive(Debug)]
pub enum ChatClient {
    OpenAi(OpenAiService),
    Gemini(GeminiService),
}

impl ChatClient {
    /// Builds the service matching `cfg.provider`.
    ///
    /// # Errors
    /// Propagates the chosen service's constructor validation errors.
    pub fn from_config(cfg: LlmModelConfig) -> Result<Self> {
        match cfg.provider {
            LlmProvider::OpenAi => Ok(ChatClient::OpenAi(OpenAiService::new(cfg)?)),
            LlmProvider::Gemini => Ok(ChatClient::Gemini(GeminiService::new(cfg)?)),
        }
    }

    /// Runs one completion turn over the transcript.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatOutcome> {
        match self {
            ChatClient::OpenAi(svc) => svc.complete(messages, tools).await,
            ChatClient::Gemini(svc) => svc.complete(messages, tools).await,
        }
    }
}
