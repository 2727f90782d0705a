//! Default LLM configs loaded strictly from environment variables.
//!
//! This module provides convenience constructors for [`LlmModelConfig`],
//! grouped by provider, plus [`config_from_env`] which picks the provider
//! from `LLM_KIND`.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`openai` or `gemini`)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u32, default 60)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = API key (mandatory)
//! - `OPENAI_MODEL`   = model name (default `gpt-4o`)
//! - `OPENAI_API_URL` = base endpoint (default `https://api.openai.com`)
//!
//! Gemini-specific:
//! - `GEMINI_API_KEY` = API key (mandatory)
//! - `GEMINI_MODEL`   = model name (default `gemini-2.0-flash`)
//! - `GEMINI_API_URL` = base endpoint (default
//!   `https://generativelanguage.googleapis.com`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, Result, env_opt, env_opt_u32, must_env, validate_http_endpoint},
};

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Constructs an OpenAI config from environment.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_MODEL`, `OPENAI_API_URL`, `LLM_MAX_TOKENS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(60)`
pub fn config_openai() -> Result<LlmModelConfig> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_opt("OPENAI_API_URL").unwrap_or_else(|| OPENAI_DEFAULT_URL.to_string());
    validate_http_endpoint("OPENAI_API_URL", &endpoint)?;
    let model = env_opt("OPENAI_MODEL").unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u32("LLM_TIMEOUT_SECS")?.map(u64::from).unwrap_or(60);

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAi,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs a Gemini config from environment.
///
/// # Env
/// - `GEMINI_API_KEY` (required)
/// - `GEMINI_MODEL`, `GEMINI_API_URL`, `LLM_MAX_TOKENS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(60)`
pub fn config_gemini() -> Result<LlmModelConfig> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let endpoint = env_opt("GEMINI_API_URL").unwrap_or_else(|| GEMINI_DEFAULT_URL.to_string());
    validate_http_endpoint("GEMINI_API_URL", &endpoint)?;
    let model = env_opt("GEMINI_MODEL").unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u32("LLM_TIMEOUT_SECS")?.map(u64::from).unwrap_or(60);

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Picks a provider config based on `LLM_KIND`.
///
/// Accepted values (case-insensitive): `openai`, `gemini`. Defaults to
/// `openai` when unset.
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for any other value, plus the
/// per-provider env errors.
pub fn config_from_env() -> Result<LlmModelConfig> {
    let kind = env_opt("LLM_KIND").unwrap_or_else(|| "openai".to_string());
    match kind.to_ascii_lowercase().as_str() {
        "openai" => config_openai(),
        "gemini" => config_gemini(),
        other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
    }
}
