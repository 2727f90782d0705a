//! Data model for code blocks, blame attribution and block history.

use serde::{Deserialize, Serialize};

/// Reference to a specific block of code inside a git repository.
///
/// Line numbers are 1-based and inclusive on both ends. A `BlockRef` is
/// immutable once constructed and is passed by reference through every
/// operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub repo_owner: String,
    pub repo_name: String,
    /// Revision to read at (branch, tag or SHA).
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Path relative to the repository root.
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl BlockRef {
    /// Checks the structural invariant `1 <= start_line <= end_line`.
    ///
    /// Range-vs-file validation happens later, once the file length at the
    /// requested revision is known.
    pub fn is_well_formed(&self) -> bool {
        self.start_line >= 1 && self.end_line >= 1 && self.start_line <= self.end_line
    }
}

/// Read-only view of a block at a point in time: the exact block text plus a
/// wider surrounding window, with resolved window bounds.
///
/// Created fresh on every fetch; not valid across revision changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeContext {
    pub block_ref: BlockRef,

    pub code_block: String,
    pub surrounding_code: String,
    /// First line of the surrounding window (clamped to `1`).
    pub context_start_line: u32,
    /// Last line of the surrounding window (clamped to file length).
    pub context_end_line: u32,

    pub file_total_lines: u32,
    /// Language tag inferred from the file extension, when recognized.
    pub language: Option<String>,
}

/// Per-line blame attribution for one source line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlameEntry {
    /// Final (current) 1-based line number.
    pub line: u32,
    /// Source text of the line, without the leading porcelain tab.
    pub code: String,

    pub commit: String,
    pub author: Option<String>,
    pub author_email: Option<String>,
    /// Author timestamp as emitted by git (`author-time`, unix seconds).
    pub author_time: Option<String>,
    /// One-line commit summary.
    pub summary: Option<String>,
    /// Filename the line originated from (differs after moves/renames).
    pub filename: Option<String>,
}

/// Ordered per-line blame for a block, ascending by line number.
///
/// Line numbers need not be contiguous when blame fails to attribute a line,
/// but each attributed line appears at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlameSet {
    pub block_ref: BlockRef,
    pub entries: Vec<BlameEntry>,
}

/// Metadata and block-relevant diff for one commit touching the block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit id.
    pub sha: String,
    pub author: String,
    pub author_email: Option<String>,
    /// Commit date exactly as git printed it (opaque).
    pub date: String,
    pub message: String,

    /// Diff text restricted to the block's file.
    pub diff_hunks_for_block: Vec<String>,
    /// Pull requests that contain this commit, when PR correlation ran.
    pub pr_numbers: Option<Vec<u64>>,
}

/// Condensed view of a pull request discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrDiscussionSummary {
    pub number: u64,
    pub title: String,
    pub url: String,

    /// Provider state string (`open`, `closed`, ...).
    pub state: String,
    pub merged_at: Option<String>,

    /// Truncated PR body.
    pub summary: String,
    /// Bounded list of comment excerpts, each tagged with its author.
    pub key_comments: Vec<String>,
}

/// Aggregated history payload for one block: blame, commits and PRs.
///
/// Every field besides `block_ref` is best-effort; a failed history fetch
/// yields `blame: None` with empty lists rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryContext {
    pub block_ref: BlockRef,

    pub blame: Option<BlameSet>,
    pub commits: Vec<CommitRecord>,
    pub prs: Vec<PrDiscussionSummary>,
}

impl HistoryContext {
    /// Empty-but-valid history for graceful degradation paths.
    pub fn empty(block_ref: BlockRef) -> Self {
        Self {
            block_ref,
            blame: None,
            commits: Vec::new(),
            prs: Vec::new(),
        }
    }
}
