/// Represents the provider (backend) used for chat completion inference.
///
/// This enum distinguishes between the OpenAI API and Google's Gemini API.
/// Adding more providers in the future (e.g., Anthropic Claude, Mistral API)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI chat completions API.
    OpenAi,
    /// Google Gemini `generateContent` API.
    Gemini,
}
