//! Agent configuration loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! - `REPOS_ROOT`               = directory holding local checkouts (mandatory)
//! - `CONTEXT_LINES`            = context window half-size (default 10)
//! - `HISTORY_MAX_COMMITS`      = commits per history request (default 10)
//! - `HISTORY_MAX_PRS`          = PRs per history request (default 5)
//! - `CONTEXT_CACHE_ENABLED`    = prefix cache toggle (default true)
//! - `CONTEXT_CACHE_TTL_SECS`   = prefix cache TTL (default 3600)
//! - `SESSION_TTL_SECS`         = conversation session TTL (default 3600)
//! - `SESSION_MAX_COUNT`        = session cap (default 1000)
//! - `AGENT_MAX_TURNS`          = model-call budget per question (default 8)

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AgentError, AgentResult};

/// Knobs for the orchestrator and its collaborators.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub repos_root: PathBuf,
    pub context_lines: u32,
    pub max_commits: usize,
    pub max_prs: usize,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub session_ttl: Duration,
    pub session_max_count: usize,
    /// Model calls allowed per question before giving up.
    pub max_turns: usize,
    /// Prior conversation turns replayed into the transcript.
    pub memory_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            repos_root: PathBuf::from("."),
            context_lines: 10,
            max_commits: 10,
            max_prs: 5,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(3600),
            session_ttl: Duration::from_secs(3600),
            session_max_count: 1000,
            max_turns: 8,
            memory_turns: 6,
        }
    }
}

impl AgentConfig {
    /// Reads the full configuration surface from the environment.
    ///
    /// # Errors
    /// [`AgentError::Config`] when `REPOS_ROOT` is missing or a numeric
    /// variable fails to parse. Configuration problems are fatal at startup,
    /// never per-request.
    pub fn from_env() -> AgentResult<Self> {
        let repos_root = std::env::var("REPOS_ROOT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AgentError::Config("REPOS_ROOT must be set".into()))?;

        let defaults = Self::default();
        Ok(Self {
            repos_root,
            context_lines: env_parse("CONTEXT_LINES", defaults.context_lines)?,
            max_commits: env_parse("HISTORY_MAX_COMMITS", defaults.max_commits)?,
            max_prs: env_parse("HISTORY_MAX_PRS", defaults.max_prs)?,
            cache_enabled: env_parse("CONTEXT_CACHE_ENABLED", defaults.cache_enabled)?,
            cache_ttl: Duration::from_secs(env_parse("CONTEXT_CACHE_TTL_SECS", 3600)?),
            session_ttl: Duration::from_secs(env_parse("SESSION_TTL_SECS", 3600)?),
            session_max_count: env_parse("SESSION_MAX_COUNT", defaults.session_max_count)?,
            max_turns: env_parse("AGENT_MAX_TURNS", defaults.max_turns)?,
            memory_turns: defaults.memory_turns,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &'static str, default: T) -> AgentResult<T> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map_err(|_| AgentError::Config(format!("invalid value in {name}"))),
        _ => Ok(default),
    }
}
