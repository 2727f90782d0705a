use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// This struct contains both general and provider-specific parameters.
/// It can be extended as needed to support new backends or features.
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (OpenAI or Gemini).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o"`, `"gemini-2.0-flash"`).
    pub model: String,

    /// Inference endpoint (base API URL without provider-specific paths).
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
