//! Deterministic prompt rendering.
//!
//! The common prefix (system prompt, code context, blame, commit history, PR
//! discussions) must render byte-identically for identical inputs and must
//! always precede the per-question suffix. Providers with implicit prefix
//! caching only get hits when the leading bytes are stable across requests,
//! so section order and formatting here are load-bearing.

use git_block_engine::{BlockRef, CodeContext, HistoryContext};

/// System role text for every conversation.
pub const SYSTEM_PROMPT: &str = "You are a code history assistant. You answer questions about a \
specific block of source code using its content, git blame attribution, commit history, and \
related pull request discussions. Ground every claim in the provided context or in tool results; \
say so when the history does not contain the answer. Keep answers concise and reference commits \
by short sha.";

/// Blame lines rendered into the prefix.
pub const MAX_BLAME_LINES: usize = 10;
/// Commits rendered into the prefix.
pub const MAX_COMMITS: usize = 5;
/// PR discussions rendered into the prefix.
pub const MAX_PRS: usize = 5;
/// Comment excerpts rendered per PR.
pub const MAX_COMMENTS_PER_PR: usize = 2;

/// Source text budget per blame line.
pub const BLAME_CODE_MAX_CHARS: usize = 60;
/// Commit message budget.
pub const COMMIT_MESSAGE_MAX_CHARS: usize = 100;
/// Comment excerpt budget (excerpts arrive pre-truncated; this re-clips).
pub const COMMENT_MAX_CHARS: usize = 200;

/// Clips to at most `max` characters on a char boundary, appending `...`
/// only when something was dropped.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max).collect();
    format!("{clipped}...")
}

fn short_sha(sha: &str) -> &str {
    &sha[..8.min(sha.len())]
}

/// Human-readable block identity plus the scoping instruction for tool use.
pub fn block_description(block_ref: &BlockRef) -> String {
    format!(
        "The code block under discussion is {owner}/{repo} at ref `{git_ref}`, file `{path}`, \
lines {start}-{end}. Scope every tool call to this block only; do not fetch unrelated files or \
ranges.",
        owner = block_ref.repo_owner,
        repo = block_ref.repo_name,
        git_ref = block_ref.git_ref,
        path = block_ref.path,
        start = block_ref.start_line,
        end = block_ref.end_line,
    )
}

/// Renders the stable common prefix: system prompt, code context, blame,
/// commits, PR discussions, in that fixed order.
pub fn render_common_prefix(
    system_prompt: &str,
    code: &CodeContext,
    history: &HistoryContext,
) -> String {
    let mut out = String::new();
    out.push_str(system_prompt);
    out.push_str("\n\n");

    let language = code.language.as_deref().unwrap_or("unknown");
    out.push_str(&format!("## Code Context (Language: {language})\n\n"));
    let fence_tag = code.language.as_deref().unwrap_or("");
    out.push_str("### Code Block:\n");
    out.push_str(&format!("```{fence_tag}\n{}\n```\n", code.code_block.trim_end_matches('\n')));

    if code.surrounding_code != code.code_block {
        out.push_str(&format!(
            "\n### Surrounding Context (lines {}-{} of {}):\n",
            code.context_start_line, code.context_end_line, code.file_total_lines
        ));
        out.push_str(&format!(
            "```{fence_tag}\n{}\n```\n",
            code.surrounding_code.trim_end_matches('\n')
        ));
    }

    if let Some(blame) = &history.blame {
        if !blame.entries.is_empty() {
            out.push_str("\n## Git Blame Information\n");
            for entry in blame.entries.iter().take(MAX_BLAME_LINES) {
                out.push_str(&format!(
                    "Line {}: {} (Commit: {}, Author: {})\n",
                    entry.line,
                    truncate_chars(entry.code.trim(), BLAME_CODE_MAX_CHARS),
                    short_sha(&entry.commit),
                    entry.author.as_deref().unwrap_or("unknown"),
                ));
            }
        }
    }

    if !history.commits.is_empty() {
        out.push_str("\n## Commit History\n");
        for commit in history.commits.iter().take(MAX_COMMITS) {
            let first_line = commit.message.lines().next().unwrap_or_default();
            out.push_str(&format!(
                "- {}: {} ({}, {})",
                short_sha(&commit.sha),
                truncate_chars(first_line, COMMIT_MESSAGE_MAX_CHARS),
                commit.author,
                commit.date,
            ));
            if let Some(prs) = commit.pr_numbers.as_ref().filter(|p| !p.is_empty()) {
                let tags: Vec<String> = prs.iter().map(|n| format!("#{n}")).collect();
                out.push_str(&format!(" [PRs: {}]", tags.join(", ")));
            }
            out.push('\n');
        }
    }

    if !history.prs.is_empty() {
        out.push_str("\n## Pull Request Discussions\n");
        for pr in history.prs.iter().take(MAX_PRS) {
            out.push_str(&format!("\n### PR #{}: {} ({})\n", pr.number, pr.title, pr.state));
            if !pr.summary.is_empty() {
                out.push_str(&format!("{}\n", pr.summary));
            }
            for comment in pr.key_comments.iter().take(MAX_COMMENTS_PER_PR) {
                out.push_str(&format!("{}\n", truncate_chars(comment, COMMENT_MAX_CHARS)));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_block_engine::{BlameEntry, BlameSet, CommitRecord, PrDiscussionSummary};

    fn block() -> BlockRef {
        BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 10,
            end_line: 12,
        }
    }

    fn code() -> CodeContext {
        CodeContext {
            block_ref: block(),
            code_block: "def f():\n    return 1\n".into(),
            surrounding_code: "# before\ndef f():\n    return 1\n# after\n".into(),
            context_start_line: 9,
            context_end_line: 13,
            file_total_lines: 30,
            language: Some("python".into()),
        }
    }

    fn history() -> HistoryContext {
        let mut history = HistoryContext::empty(block());
        history.blame = Some(BlameSet {
            block_ref: block(),
            entries: vec![BlameEntry {
                line: 10,
                code: "def f():".into(),
                commit: "abcdef0123456789abcdef0123456789abcdef01".into(),
                author: Some("Alice".into()),
                author_email: None,
                author_time: None,
                summary: Some("add f".into()),
                filename: None,
            }],
        });
        history.commits = vec![CommitRecord {
            sha: "abcdef0123456789abcdef0123456789abcdef01".into(),
            author: "Alice".into(),
            author_email: Some("alice@example.com".into()),
            date: "2024-01-01".into(),
            message: "add f\n\nlong body".into(),
            diff_hunks_for_block: vec![],
            pr_numbers: Some(vec![7]),
        }];
        history.prs = vec![PrDiscussionSummary {
            number: 7,
            title: "Add f".into(),
            url: "https://example.com/pr/7".into(),
            state: "merged".into(),
            merged_at: None,
            summary: "Adds f.".into(),
            key_comments: vec!["[@bob] looks good".into()],
        }];
        history
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_common_prefix(SYSTEM_PROMPT, &code(), &history());
        let b = render_common_prefix(SYSTEM_PROMPT, &code(), &history());
        assert_eq!(a, b);
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let text = render_common_prefix(SYSTEM_PROMPT, &code(), &history());
        let code_at = text.find("## Code Context").unwrap();
        let blame_at = text.find("## Git Blame Information").unwrap();
        let commits_at = text.find("## Commit History").unwrap();
        let prs_at = text.find("## Pull Request Discussions").unwrap();
        assert!(code_at < blame_at && blame_at < commits_at && commits_at < prs_at);
        assert!(text.starts_with(SYSTEM_PROMPT));
    }

    #[test]
    fn blame_line_carries_short_sha_and_author() {
        let text = render_common_prefix(SYSTEM_PROMPT, &code(), &history());
        assert!(text.contains("Line 10: def f(): (Commit: abcdef01, Author: Alice)"));
    }

    #[test]
    fn commit_line_shows_first_message_line_and_prs() {
        let text = render_common_prefix(SYSTEM_PROMPT, &code(), &history());
        assert!(text.contains("- abcdef01: add f (Alice, 2024-01-01) [PRs: #7]"));
        assert!(!text.contains("long body"));
    }

    #[test]
    fn identical_block_and_window_skip_surrounding_section() {
        let mut ctx = code();
        ctx.surrounding_code = ctx.code_block.clone();
        let text = render_common_prefix(SYSTEM_PROMPT, &ctx, &history());
        assert!(!text.contains("### Surrounding Context"));
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let s = "é".repeat(80);
        let t = truncate_chars(&s, 60);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), 63);
    }

    #[test]
    fn block_description_names_the_range() {
        let desc = block_description(&block());
        assert!(desc.contains("acme/widgets"));
        assert!(desc.contains("lines 10-12"));
    }
}
