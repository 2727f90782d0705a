//! Provider-agnostic model configuration.

pub mod default_config;
pub mod llm_model_config;
pub mod llm_provider;

pub use default_config::{config_from_env, config_gemini, config_openai};
pub use llm_model_config::LlmModelConfig;
pub use llm_provider::LlmProvider;
