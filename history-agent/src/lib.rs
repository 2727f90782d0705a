//! Tool-calling agent that answers questions about a block of code using its
//! git history.
//!
//! Pieces:
//! - [`agent::HistoryAgent`] — the orchestrator loop over the model
//! - [`tools`] — the fixed tool menu and typed argument decoding
//! - [`prompt`] — deterministic, prefix-cache-friendly rendering
//! - [`cache`] — TTL cache of rendered context keyed by block identity
//! - [`sessions`] — TTL/LRU-bounded conversation memory
//! - [`config`] — environment-driven knobs

pub mod agent;
pub mod cache;
pub mod config;
pub mod errors;
pub mod prompt;
pub mod sessions;
pub mod tools;

pub use agent::HistoryAgent;
pub use cache::{ContextCache, cache_key};
pub use config::AgentConfig;
pub use errors::{AgentError, AgentResult};
pub use sessions::{ConversationMemory, SessionStats, SessionTurn};
