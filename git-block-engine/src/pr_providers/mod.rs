//! Pull-request provider clients used for commit→PR correlation.
//!
//! Only GitHub is wired in today; the module keeps the same shape as the
//! enum-dispatch provider facades elsewhere in the workspace so another
//! provider slots in without touching the history assembler.

pub mod github;
pub mod summarize;

pub use github::{GitHubClient, GitHubConfig, PrDiscussion, PrRecord};
pub use summarize::summarize_pr;
