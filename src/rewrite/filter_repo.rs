//! rewrite::filter_repo
//!
//! `git filter-repo` backend.
//!
//! The rewrite is a single invocation:
//!
//! ```text
//! git filter-repo --force --invert-paths --path AGENTS.md --path TASKS.md \
//!     --refs <merge_base>..<branch>
//! ```
//!
//! Restricting `--refs` to the range makes filter-repo export only the new
//! commits, each as a diff against its parent. Dropping the managed paths
//! from those diffs leaves every managed path at its merge-base state.

use std::path::Path;

use tracing::debug;

use super::traits::{CleanupOutcome, HistoryRewriter, RewriteError, RewriteRequest};
use crate::core::paths::TwinPaths;
use crate::git::process;

const TOOL: &str = "git-filter-repo";

/// Rewriter driving `git filter-repo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterRepo;

impl FilterRepo {
    /// Arguments passed to `git` for a request.
    pub fn args(request: &RewriteRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "filter-repo".to_string(),
            "--force".to_string(),
            "--invert-paths".to_string(),
        ];
        for path in request.paths {
            args.push("--path".to_string());
            args.push(path.clone());
        }
        args.push("--refs".to_string());
        args.push(format!("{}..{}", request.merge_base, request.branch));
        args
    }
}

impl HistoryRewriter for FilterRepo {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn ensure_available(&self, work_dir: &Path) -> Result<(), RewriteError> {
        let unavailable = || RewriteError::Unavailable {
            tool: TOOL,
            hint: "install git-filter-repo or run `twin config set rewrite_tool filter-branch`"
                .to_string(),
        };
        match process::run("git", ["filter-repo", "--version"], work_dir, &[]) {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => {
                debug!(stderr = %out.diagnostic(), "filter-repo version check failed");
                Err(unavailable())
            }
            Err(e) => {
                debug!(error = %e, "could not run git");
                Err(unavailable())
            }
        }
    }

    fn clear_state(&self, _work_dir: &Path, git_dir: &Path) -> CleanupOutcome {
        let dir = TwinPaths::new(git_dir).filter_repo_state_dir();
        if !dir.exists() {
            return CleanupOutcome::Absent;
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => CleanupOutcome::Removed,
            Err(e) => CleanupOutcome::Failed(format!("{}: {}", dir.display(), e)),
        }
    }

    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<(), RewriteError> {
        let args = Self::args(request);
        debug!(command = %process::render("git", &args), "rewriting history");

        let out = process::run("git", &args, request.work_dir, &[]).map_err(|e| {
            RewriteError::Spawn {
                tool: TOOL,
                message: e.to_string(),
            }
        })?;

        if !out.success() {
            return Err(RewriteError::ToolFailed {
                tool: TOOL,
                stderr: out.diagnostic().to_string(),
            });
        }
        Ok(())
    }
}
