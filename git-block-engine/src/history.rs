//! History assembler: blame → deduplicated commits → optional PR correlation.
//!
//! History is best-effort by design. A failed blame fetch degrades the whole
//! result to an empty-but-valid [`HistoryContext`]; failures on individual
//! commits or PRs skip only that item. Nothing in this module propagates an
//! error to the caller.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::blame::get_blame_set;
use crate::pr_providers::{GitHubClient, summarize_pr};
use crate::repo::GitWorkspace;
use crate::types::{BlameEntry, BlameSet, BlockRef, CommitRecord, HistoryContext};

/// Knobs for one history request.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Upper bound on distinct commits retained from blame.
    pub max_commits: usize,
    /// Whether to correlate commits with pull requests.
    pub include_prs: bool,
    /// Upper bound on PR discussions fetched.
    pub max_prs: usize,
    /// Per-PR bound on raw reviews/comments pulled before summarizing.
    pub max_pr_comments: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_commits: 10,
            include_prs: true,
            max_prs: 5,
            max_pr_comments: 10,
        }
    }
}

/// Collects commit ids from blame entries, deduplicating while preserving
/// first-seen order, truncated to `max`.
pub fn dedupe_commit_shas(entries: &[BlameEntry], max: usize) -> Vec<String> {
    let mut shas: Vec<String> = Vec::new();
    for entry in entries {
        if entry.commit.is_empty() {
            continue;
        }
        if !shas.contains(&entry.commit) {
            shas.push(entry.commit.clone());
        }
    }
    shas.truncate(max);
    shas
}

/// Builds the aggregated history payload for one block.
///
/// Steps: blame the exact range, deduplicate commit SHAs, fetch per-commit
/// metadata and the diff restricted to the block's file, then (optionally)
/// correlate commits with PRs and fold the PR discussions in.
pub async fn build_history_context(
    ws: &GitWorkspace,
    pr_client: Option<&GitHubClient>,
    block_ref: &BlockRef,
    opts: &HistoryOptions,
) -> HistoryContext {
    let blame: BlameSet = match get_blame_set(ws, block_ref).await {
        Ok(b) => b,
        Err(e) => {
            warn!(
                path = %block_ref.path,
                error = %e,
                "blame fetch failed, returning empty history"
            );
            return HistoryContext::empty(block_ref.clone());
        }
    };

    let shas = dedupe_commit_shas(&blame.entries, opts.max_commits);
    debug!(commits = shas.len(), "distinct commits retained from blame");

    let mut commits: Vec<CommitRecord> = Vec::new();
    for sha in &shas {
        match fetch_commit_record(ws, block_ref, sha).await {
            Ok(Some(record)) => commits.push(record),
            Ok(None) => debug!(sha = %sha, "commit metadata incomplete, skipped"),
            Err(e) => warn!(sha = %sha, error = %e, "commit fetch failed, skipped"),
        }
    }

    let mut prs = Vec::new();
    if opts.include_prs {
        if let Some(client) = pr_client {
            prs = correlate_prs(client, block_ref, &shas, &mut commits, opts).await;
        }
    }

    HistoryContext {
        block_ref: block_ref.clone(),
        blame: Some(blame),
        commits,
        prs,
    }
}

/// Fetches metadata and the block-file diff for one commit.
///
/// Returns `Ok(None)` when the metadata output has fewer than the four
/// expected leading fields (sha, author, email, date).
async fn fetch_commit_record(
    ws: &GitWorkspace,
    block_ref: &BlockRef,
    sha: &str,
) -> crate::errors::GitBlockResult<Option<CommitRecord>> {
    let repo_path = ws.resolve_repo_path(block_ref)?;

    let meta = ws
        .run_git(
            &["show", "-s", "--format=%H%n%an%n%ae%n%ad%n%B", sha],
            &repo_path,
        )
        .await?;
    let meta_lines: Vec<&str> = meta.lines().collect();
    if meta_lines.len() < 4 {
        return Ok(None);
    }

    let full_sha = meta_lines[0].to_string();
    let author = meta_lines[1].to_string();
    let author_email = match meta_lines[2] {
        "" => None,
        email => Some(email.to_string()),
    };
    let date = meta_lines[3].to_string();
    let message = meta_lines[4..].join("\n").trim().to_string();

    let diff = ws
        .run_git(&["show", sha, "--", &block_ref.path], &repo_path)
        .await?;

    Ok(Some(CommitRecord {
        sha: full_sha,
        author,
        author_email,
        date,
        message,
        diff_hunks_for_block: vec![diff],
        pr_numbers: None,
    }))
}

/// Correlates retained commits with PRs, annotates commit records with PR
/// numbers, and returns bounded discussion summaries.
async fn correlate_prs(
    client: &GitHubClient,
    block_ref: &BlockRef,
    shas: &[String],
    commits: &mut [CommitRecord],
    opts: &HistoryOptions,
) -> Vec<crate::types::PrDiscussionSummary> {
    let commit_to_prs = client
        .find_prs_for_commits(&block_ref.repo_owner, &block_ref.repo_name, shas)
        .await;

    // Annotate each commit with the PR numbers it belongs to.
    let number_map: HashMap<&str, Vec<u64>> = commit_to_prs
        .iter()
        .map(|(sha, prs)| (sha.as_str(), prs.iter().map(|p| p.number).collect()))
        .collect();
    for commit in commits.iter_mut() {
        if let Some(numbers) = number_map.get(commit.sha.as_str()) {
            if !numbers.is_empty() {
                commit.pr_numbers = Some(numbers.clone());
            }
        }
    }

    // Candidate PRs: unique by number across all commits, in SHA order.
    let mut candidates: Vec<u64> = Vec::new();
    for sha in shas {
        if let Some(prs) = commit_to_prs.get(sha) {
            for pr in prs {
                if !candidates.contains(&pr.number) {
                    candidates.push(pr.number);
                }
            }
        }
    }
    candidates.truncate(opts.max_prs);

    let mut summaries = Vec::new();
    for number in candidates {
        match client
            .get_pr_discussion(
                &block_ref.repo_owner,
                &block_ref.repo_name,
                number,
                opts.max_pr_comments,
            )
            .await
        {
            Ok(discussion) => {
                summaries.push(summarize_pr(
                    &discussion.pr,
                    Some(&discussion),
                    opts.max_pr_comments,
                ));
            }
            Err(e) => {
                warn!(number, error = %e, "PR discussion fetch failed, skipped");
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: u32, sha: &str) -> BlameEntry {
        BlameEntry {
            line,
            code: "code".into(),
            commit: sha.into(),
            author: None,
            author_email: None,
            author_time: None,
            summary: None,
            filename: None,
        }
    }

    #[test]
    fn dedupe_preserves_first_seen_order() {
        let entries = vec![
            entry(1, "bbb"),
            entry(2, "aaa"),
            entry(3, "bbb"),
            entry(4, "ccc"),
            entry(5, "aaa"),
        ];
        assert_eq!(dedupe_commit_shas(&entries, 10), vec!["bbb", "aaa", "ccc"]);
    }

    #[test]
    fn dedupe_truncates_to_max() {
        let entries = vec![entry(1, "a"), entry(2, "b"), entry(3, "c")];
        assert_eq!(dedupe_commit_shas(&entries, 2), vec!["a", "b"]);
    }

    #[test]
    fn dedupe_skips_empty_shas() {
        let entries = vec![entry(1, ""), entry(2, "a")];
        assert_eq!(dedupe_commit_shas(&entries, 10), vec!["a"]);
    }

    #[tokio::test]
    async fn missing_repo_degrades_to_empty_history() {
        let ws = GitWorkspace::new("/nonexistent-repos-root");
        let block_ref = BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 1,
            end_line: 3,
        };
        let history =
            build_history_context(&ws, None, &block_ref, &HistoryOptions::default()).await;
        assert!(history.blame.is_none());
        assert!(history.commits.is_empty());
        assert!(history.prs.is_empty());
    }
}
