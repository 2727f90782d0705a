//! Core engine for answering "what is this block of code and where did it
//! come from" questions against local git checkouts.
//!
//! The crate is organized around a small pipeline:
//!
//! 1. **Repository accessor** ([`repo::GitWorkspace`]) — resolves a
//!    [`types::BlockRef`] against a configured repositories root, reads file
//!    content at a revision via `git show`, and extracts the block plus a
//!    clamped context window.
//! 2. **Blame parser** ([`blame`]) — turns `git blame --line-porcelain`
//!    output into structured per-line attribution records.
//! 3. **History assembler** ([`history`]) — deduplicates blame commits,
//!    fetches per-commit metadata/diffs, and optionally correlates commits
//!    with pull requests through the [`pr_providers`] collaborator.
//!
//! All git I/O goes through short-lived subprocesses; PR correlation uses the
//! GitHub REST API. History assembly never fails: it degrades to an
//! empty-but-valid payload instead.

pub mod blame;
pub mod errors;
pub mod history;
pub mod pr_providers;
pub mod repo;
pub mod types;

pub use blame::{get_blame_set, parse_blame_porcelain};
pub use errors::{GitBlockError, GitBlockResult, PrProviderError};
pub use history::{HistoryOptions, build_history_context, dedupe_commit_shas};
pub use pr_providers::{GitHubClient, GitHubConfig};
pub use repo::{GitWorkspace, infer_language};
pub use types::{
    BlameEntry, BlameSet, BlockRef, CodeContext, CommitRecord, HistoryContext,
    PrDiscussionSummary,
};
