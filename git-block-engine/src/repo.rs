//! Repository accessor: local checkout resolution and git subprocess I/O.
//!
//! Each git invocation is a blocking, short-lived subprocess scoped to one
//! repository checkout directory; there is no shared mutable state between
//! invocations.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::errors::{GitBlockError, GitBlockResult};
use crate::types::{BlockRef, CodeContext};

/// Accessor over a directory of local repository checkouts.
///
/// Repositories are expected at `{repos_root}/{repo_name}`; this type never
/// creates directories or clones anything.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    repos_root: PathBuf,
}

impl GitWorkspace {
    pub fn new(repos_root: impl Into<PathBuf>) -> Self {
        Self {
            repos_root: repos_root.into(),
        }
    }

    pub fn repos_root(&self) -> &Path {
        &self.repos_root
    }

    /// Maps `block_ref.repo_name` onto the repositories root.
    ///
    /// # Errors
    /// [`GitBlockError::RepositoryNotFound`] when the directory is absent.
    pub fn resolve_repo_path(&self, block_ref: &BlockRef) -> GitBlockResult<PathBuf> {
        let repo_path = self.repos_root.join(&block_ref.repo_name);
        if !repo_path.exists() {
            return Err(GitBlockError::RepositoryNotFound { path: repo_path });
        }
        Ok(repo_path)
    }

    /// Runs `git <args>` inside `repo_path` and returns stdout.
    ///
    /// # Errors
    /// [`GitBlockError::VersionControl`] with the failed command and stderr
    /// on non-zero exit; [`GitBlockError::Io`] if the process cannot spawn.
    pub async fn run_git(&self, args: &[&str], repo_path: &Path) -> GitBlockResult<String> {
        debug!(cwd = %repo_path.display(), "git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(repo_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitBlockError::VersionControl {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Reads the file content at `{ref}:{path}` and splits it into lines
    /// without terminators. Returns the lines and the total line count.
    pub async fn read_file_at_ref(
        &self,
        block_ref: &BlockRef,
    ) -> GitBlockResult<(Vec<String>, u32)> {
        let repo_path = self.resolve_repo_path(block_ref)?;
        let spec = format!("{}:{}", block_ref.git_ref, block_ref.path);
        let output = self.run_git(&["show", &spec], &repo_path).await?;
        let lines: Vec<String> = output.lines().map(str::to_string).collect();
        let total = lines.len() as u32;
        Ok((lines, total))
    }

    /// Extracts the exact block text plus a symmetric context window clamped
    /// to file bounds, and attaches the inferred language.
    ///
    /// # Errors
    /// [`GitBlockError::InvalidRange`] unless
    /// `1 <= start_line <= end_line <= file_total_lines`.
    pub async fn get_code_context(
        &self,
        block_ref: &BlockRef,
        context_lines: u32,
    ) -> GitBlockResult<CodeContext> {
        let (lines, total) = self.read_file_at_ref(block_ref).await?;

        let start = block_ref.start_line;
        let end = block_ref.end_line;
        if start < 1 || start > end || end > total {
            return Err(GitBlockError::InvalidRange { start, end, total });
        }

        let ctx_start = start.saturating_sub(context_lines).max(1);
        let ctx_end = end.saturating_add(context_lines).min(total);

        // 1-based inclusive slicing.
        let code_block = lines[(start - 1) as usize..end as usize].join("\n");
        let surrounding_code = lines[(ctx_start - 1) as usize..ctx_end as usize].join("\n");

        Ok(CodeContext {
            block_ref: block_ref.clone(),
            code_block,
            surrounding_code,
            context_start_line: ctx_start,
            context_end_line: ctx_end,
            file_total_lines: total,
            language: infer_language(&block_ref.path).map(str::to_string),
        })
    }
}

/// Maps a file extension to a language tag. Pure, total, no I/O.
pub fn infer_language(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "py" => Some("python"),
        "ts" => Some("typescript"),
        "js" => Some("javascript"),
        "java" => Some("java"),
        "cpp" | "cc" | "cxx" | "hpp" => Some("cpp"),
        "c" | "h" => Some("c"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        "rb" => Some("ruby"),
        "php" => Some("php"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_table() {
        assert_eq!(infer_language("src/app.py"), Some("python"));
        assert_eq!(infer_language("lib/mod.RS"), Some("rust"));
        assert_eq!(infer_language("include/vec.hpp"), Some("cpp"));
        assert_eq!(infer_language("kernel.c"), Some("c"));
        assert_eq!(infer_language("README.md"), None);
        assert_eq!(infer_language("Makefile"), None);
    }

    #[test]
    fn missing_repo_is_not_found() {
        let ws = GitWorkspace::new("/nonexistent-repos-root");
        let block_ref = BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 1,
            end_line: 1,
        };
        let err = ws.resolve_repo_path(&block_ref).unwrap_err();
        assert!(matches!(err, GitBlockError::RepositoryNotFound { .. }));
    }
}
