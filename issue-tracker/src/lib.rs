//! Issue tracker integration (Linear).
//!
//! Exposes a small async client over Linear's GraphQL API: list teams,
//! fetch and search issues, create/update issues and add comments.

pub mod client;
pub mod errors;
pub mod types;

pub use client::{LINEAR_API_URL, LinearClient};
pub use errors::{IssueTrackerError, IssueTrackerResult};
pub use types::{Issue, IssueComment, IssueQuery, Label, NewIssue, Team, UserRef, WorkflowState};
