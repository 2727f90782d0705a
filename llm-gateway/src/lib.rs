//! Unified chat gateway over OpenAI and Gemini with tool calling.
//!
//! The crate exposes:
//! - [`config`] — provider selection and model parameters from environment
//! - [`chat`] — provider-neutral transcript and tool types
//! - [`services`] — per-provider clients and the [`ChatClient`] dispatcher
//! - [`error_handler`] — unified error types and env helpers

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod services;

pub use chat::{ChatMessage, ChatOutcome, ChatRole, ToolCallRequest, ToolSpec};
pub use config::{LlmModelConfig, LlmProvider, config_from_env, config_gemini, config_openai};
pub use error_handler::{LlmGatewayError, Result};
pub use services::{ChatClient, GeminiService, OpenAiService};
