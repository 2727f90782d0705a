//! Parser for `git blame --line-porcelain` output.
//!
//! Each attributed line group starts with a header `<sha> <orig> <final>
//! [group-size]`, followed by `key value` metadata lines and terminated by a
//! tab-prefixed line carrying the source text. Malformed groups are skipped
//! silently; the parser only emits records for well-formed groups and never
//! fails on bad input.

use std::path::Path;

use tracing::debug;

use crate::errors::GitBlockResult;
use crate::repo::GitWorkspace;
use crate::types::{BlameEntry, BlameSet, BlockRef};

/// Accumulator for the group currently being parsed.
#[derive(Debug, Default)]
struct PendingAttribution {
    sha: String,
    final_line: u32,
    author: Option<String>,
    author_email: Option<String>,
    author_time: Option<String>,
    summary: Option<String>,
    filename: Option<String>,
}

/// Parses raw porcelain output into per-line blame entries, in input order.
pub fn parse_blame_porcelain(output: &str) -> Vec<BlameEntry> {
    let mut entries: Vec<BlameEntry> = Vec::new();
    let mut current: Option<PendingAttribution> = None;

    for line in output.lines() {
        // Content line: emit the accumulated attribution, if any.
        if let Some(code) = line.strip_prefix('\t') {
            if let Some(acc) = current.take() {
                entries.push(BlameEntry {
                    line: acc.final_line,
                    code: code.to_string(),
                    commit: acc.sha,
                    author: acc.author,
                    author_email: acc.author_email,
                    author_time: acc.author_time,
                    summary: acc.summary,
                    filename: acc.filename,
                });
            }
            continue;
        }

        // Header line: `<sha> <orig-line> <final-line> [group-size]`.
        if current.is_none() {
            let mut parts = line.split_whitespace();
            let sha = parts.next();
            let _orig = parts.next();
            let final_line = parts.next().and_then(|s| s.parse::<u32>().ok());
            if let (Some(sha), Some(final_line)) = (sha, final_line) {
                current = Some(PendingAttribution {
                    sha: sha.to_string(),
                    final_line,
                    ..PendingAttribution::default()
                });
            }
            // A metadata line arriving with no header in progress falls
            // through here and is dropped: the whole group is skipped.
            continue;
        }

        if let (Some(acc), Some((key, value))) = (current.as_mut(), line.split_once(' ')) {
            let value = value.trim().to_string();
            match key {
                "author" => acc.author = Some(value),
                "author-mail" => acc.author_email = Some(value),
                "author-time" => acc.author_time = Some(value),
                "summary" => acc.summary = Some(value),
                "filename" => acc.filename = Some(value),
                _ => {}
            }
        }
    }

    entries
}

/// Fetches blame for the exact `[start_line, end_line]` range of a block.
pub async fn get_blame_set(ws: &GitWorkspace, block_ref: &BlockRef) -> GitBlockResult<BlameSet> {
    let repo_path = ws.resolve_repo_path(block_ref)?;
    let range = format!("{},{}", block_ref.start_line, block_ref.end_line);
    let output = ws
        .run_git(
            &[
                "blame",
                "-L",
                &range,
                "--line-porcelain",
                &block_ref.git_ref,
                "--",
                &block_ref.path,
            ],
            Path::new(&repo_path),
        )
        .await?;

    let entries = parse_blame_porcelain(&output);
    debug!(
        path = %block_ref.path,
        range = %range,
        entries = entries.len(),
        "blame parsed"
    );

    Ok(BlameSet {
        block_ref: block_ref.clone(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_well_formed_group() {
        let raw = "abc123 5 5 1\n\
                   author A\n\
                   author-mail <a@x.com>\n\
                   author-time 1700000000\n\
                   summary msg\n\
                   filename a.py\n\
                   \tlet x = 1;\n";
        let entries = parse_blame_porcelain(raw);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.commit, "abc123");
        assert_eq!(e.line, 5);
        assert_eq!(e.code, "let x = 1;");
        assert_eq!(e.author.as_deref(), Some("A"));
        assert_eq!(e.author_email.as_deref(), Some("<a@x.com>"));
        assert_eq!(e.summary.as_deref(), Some("msg"));
        assert_eq!(e.filename.as_deref(), Some("a.py"));
    }

    #[test]
    fn multiple_groups_preserve_order() {
        let raw = "aaa111 1 10 1\nauthor A\nsummary first\n\tfn a() {}\n\
                   bbb222 2 11 1\nauthor B\nsummary second\n\tfn b() {}\n";
        let entries = parse_blame_porcelain(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, 10);
        assert_eq!(entries[1].line, 11);
        assert_eq!(entries[1].commit, "bbb222");
    }

    #[test]
    fn metadata_without_header_is_skipped() {
        // Truncated group: metadata/content with no preceding header.
        let raw = "author Ghost\nsummary orphan\n\torphan line\n";
        let entries = parse_blame_porcelain(raw);
        // "author Ghost" parses as a bogus header only if its third field is
        // numeric; it is not, so nothing accumulates and nothing is emitted.
        assert!(entries.is_empty());
    }

    #[test]
    fn unrecognized_metadata_keys_are_ignored() {
        let raw = "abc123 5 5\n\
                   author A\n\
                   committer C\n\
                   committer-time 1700000001\n\
                   boundary\n\
                   summary msg\n\
                   \tcode\n";
        let entries = parse_blame_porcelain(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author.as_deref(), Some("A"));
    }

    #[test]
    fn empty_input_yields_no_entries() {
        assert!(parse_blame_porcelain("").is_empty());
    }
}
