use std::sync::Arc;

use history_agent::HistoryAgent;

use crate::error_handler::{AppError, AppResult};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The question-answering agent with its collaborators wired in.
    pub agent: Arc<HistoryAgent>,
}

impl AppState {
    /// Load shared state from environment variables.
    pub fn from_env() -> AppResult<Self> {
        let agent = HistoryAgent::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self {
            agent: Arc::new(agent),
        })
    }
}
