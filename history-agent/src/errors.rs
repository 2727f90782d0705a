//! Error hierarchy for the history-agent crate.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type AgentResult<T> = Result<T, AgentError>;

/// Root error type for the history-agent crate.
///
/// Repository/range failures and model failures are fatal to a request.
/// Issue-tracker and PR failures never surface here; those paths degrade to
/// empty tool results instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Code/history fetch failed outside the best-effort paths.
    #[error(transparent)]
    Git(#[from] git_block_engine::GitBlockError),

    /// The model-call collaborator failed.
    #[error(transparent)]
    Llm(#[from] llm_gateway::LlmGatewayError),

    /// The model requested a tool that is not in the menu. This signals the
    /// menu and the dispatch table have drifted apart, so it is fatal.
    #[error("unknown tool requested by model: {0}")]
    UnknownTool(String),

    /// The model kept requesting tools past the configured turn budget.
    #[error("model did not produce an answer within {0} turns")]
    TurnBudgetExhausted(usize),

    /// Tool result serialization failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Startup configuration problem.
    #[error("configuration error: {0}")]
    Config(String),
}
