use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use git_block_engine::GitBlockError;
use history_agent::AgentError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Maps agent failures onto HTTP statuses: a request that referenced
/// something invalid is the caller's fault (4xx); model and internal
/// failures are ours (5xx).
impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Git(GitBlockError::RepositoryNotFound { path }) => AppError::Http {
                status: StatusCode::NOT_FOUND,
                code: "REPO_NOT_FOUND",
                message: format!("Repository checkout not found at {}", path.display()),
            },
            AgentError::Git(GitBlockError::InvalidRange { start, end, total }) => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_RANGE",
                message: format!(
                    "Line range {start}-{end} is invalid for a file of {total} lines"
                ),
            },
            AgentError::Git(GitBlockError::VersionControl { command, stderr }) => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "GIT_ERROR",
                message: format!("`{command}` failed: {stderr}"),
            },
            AgentError::Llm(e) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "LLM_ERROR",
                message: e.to_string(),
            },
            other => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "AGENT_ERROR",
                message: other.to_string(),
            },
        }
    }
}
