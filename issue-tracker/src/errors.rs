//! Error hierarchy for the issue-tracker crate.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type IssueTrackerResult<T> = Result<T, IssueTrackerError>;

/// Root error type for the issue-tracker crate.
#[derive(Debug, Error)]
pub enum IssueTrackerError {
    /// API key is absent; the client cannot be constructed.
    #[error("issue tracker API key not found")]
    MissingApiKey,

    /// The GraphQL endpoint reported errors in its response payload.
    #[error("issue tracker API errors: {0}")]
    Api(String),

    /// Non-2xx HTTP status from the endpoint.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Response payload could not be decoded as expected.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A mutation reported `success: false`.
    #[error("mutation rejected: {0}")]
    MutationFailed(&'static str),
}

impl From<reqwest::Error> for IssueTrackerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return IssueTrackerError::Timeout;
        }
        if let Some(status) = e.status() {
            return IssueTrackerError::HttpStatus(status.as_u16());
        }
        IssueTrackerError::Network(e.to_string())
    }
}
