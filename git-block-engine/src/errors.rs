//! Crate-wide error hierarchy for git-block-engine.

use std::path::PathBuf;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GitBlockResult<T> = Result<T, GitBlockError>;

/// Root error type for the git-block-engine crate.
#[derive(Debug, Error)]
pub enum GitBlockError {
    /// The repository directory does not exist under the configured root.
    #[error("repository not found: {path}")]
    RepositoryNotFound { path: PathBuf },

    /// The requested line range does not fit the file at the given revision.
    #[error("invalid line range {start}-{end} for file with {total} lines")]
    InvalidRange { start: u32, end: u32, total: u32 },

    /// A git subprocess exited non-zero. Carries the command and stderr.
    #[error("git command failed: {command}\n{stderr}")]
    VersionControl { command: String, stderr: String },

    /// PR provider (GitHub) related failure.
    #[error(transparent)]
    Provider(#[from] PrProviderError),

    /// I/O failure while spawning or reading a subprocess.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Provider-specific error used inside the PR provider layer.
#[derive(Debug, Error)]
pub enum PrProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403, includes rate-limit denials without 429).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited {
        /// Optional `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// JSON deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for PrProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PrProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => PrProviderError::Unauthorized,
                403 => PrProviderError::Forbidden,
                404 => PrProviderError::NotFound,
                429 => PrProviderError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => PrProviderError::Server(code),
                _ => PrProviderError::HttpStatus(code),
            };
        }
        PrProviderError::Network(e.to_string())
    }
}

impl From<reqwest::Error> for GitBlockError {
    fn from(e: reqwest::Error) -> Self {
        GitBlockError::Provider(PrProviderError::from(e))
    }
}
