//! Integration tests against a real throwaway git repository.

use std::path::Path;
use std::process::Command;

use git_block_engine::{
    BlockRef, GitBlockError, GitWorkspace, HistoryOptions, build_history_context, get_blame_set,
};

/// Runs git with a fixed identity so commits work in bare CI environments.
fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-c")
        .arg("user.name=Test")
        .arg("-c")
        .arg("user.email=test@example.com")
        .args(args)
        .current_dir(repo)
        .status()
        .expect("git binary available");
    assert!(status.success(), "git {args:?} failed");
}

/// Creates `{root}/widgets` with `a.py` (30 lines) committed on `main`.
fn seed_repo(root: &Path) {
    let repo = root.join("widgets");
    std::fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-q"]);
    git(&repo, &["checkout", "-q", "-B", "main"]);

    let body: String = (1..=30).map(|i| format!("line {i}\n")).collect();
    std::fs::write(repo.join("a.py"), body).unwrap();
    git(&repo, &["add", "a.py"]);
    git(&repo, &["commit", "-q", "-m", "add a.py"]);
}

fn block(start: u32, end: u32) -> BlockRef {
    BlockRef {
        repo_owner: "acme".into(),
        repo_name: "widgets".into(),
        git_ref: "main".into(),
        path: "a.py".into(),
        start_line: start,
        end_line: end,
    }
}

#[tokio::test]
async fn code_context_window_is_clamped() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let ctx = ws.get_code_context(&block(10, 12), 5).await.unwrap();
    assert_eq!(ctx.context_start_line, 5);
    assert_eq!(ctx.context_end_line, 17);
    assert_eq!(ctx.file_total_lines, 30);
    assert_eq!(ctx.language.as_deref(), Some("python"));
    assert_eq!(ctx.code_block.lines().count(), 3);
    assert_eq!(ctx.code_block.lines().next(), Some("line 10"));
    assert_eq!(ctx.surrounding_code.lines().count(), 13);
}

#[tokio::test]
async fn context_window_clamps_at_file_edges() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let ctx = ws.get_code_context(&block(1, 2), 10).await.unwrap();
    assert_eq!(ctx.context_start_line, 1);
    assert_eq!(ctx.context_end_line, 12);

    let ctx = ws.get_code_context(&block(28, 30), 10).await.unwrap();
    assert_eq!(ctx.context_start_line, 18);
    assert_eq!(ctx.context_end_line, 30);
}

#[tokio::test]
async fn huge_context_budget_saturates_to_file_bounds() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let ctx = ws.get_code_context(&block(10, 12), u32::MAX).await.unwrap();
    assert_eq!(ctx.context_start_line, 1);
    assert_eq!(ctx.context_end_line, 30);
    assert_eq!(ctx.surrounding_code.lines().count(), 30);
}

#[tokio::test]
async fn out_of_bounds_range_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let err = ws.get_code_context(&block(10, 99), 5).await.unwrap_err();
    assert!(matches!(err, GitBlockError::InvalidRange { total: 30, .. }));
}

#[tokio::test]
async fn unknown_revision_is_a_version_control_error() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let mut bad = block(1, 2);
    bad.git_ref = "no-such-branch".into();
    let err = ws.get_code_context(&bad, 5).await.unwrap_err();
    match err {
        GitBlockError::VersionControl { command, .. } => {
            assert!(command.starts_with("git show"));
        }
        other => panic!("expected VersionControl, got {other:?}"),
    }
}

#[tokio::test]
async fn blame_attributes_every_requested_line() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let blame = get_blame_set(&ws, &block(10, 12)).await.unwrap();
    let lines: Vec<u32> = blame.entries.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![10, 11, 12]);
    assert_eq!(blame.entries[0].author.as_deref(), Some("Test"));
    assert_eq!(blame.entries[0].summary.as_deref(), Some("add a.py"));
}

#[tokio::test]
async fn history_collects_the_single_commit() {
    let tmp = tempfile::tempdir().unwrap();
    seed_repo(tmp.path());
    let ws = GitWorkspace::new(tmp.path());

    let history =
        build_history_context(&ws, None, &block(10, 12), &HistoryOptions::default()).await;
    assert!(history.blame.is_some());
    assert_eq!(history.commits.len(), 1);
    let commit = &history.commits[0];
    assert_eq!(commit.author, "Test");
    assert_eq!(commit.message, "add a.py");
    assert_eq!(commit.sha.len(), 40);
    assert!(history.prs.is_empty());
}
