//! rewrite::filter_branch
//!
//! `git filter-branch` backend.
//!
//! filter-branch ships with git, so this backend works wherever git does.
//! It runs an index filter over `<merge_base>..<branch>`:
//!
//! 1. `git rm --cached` drops the managed paths from each commit's index.
//! 2. `git update-index --index-info` re-adds the merge-base entries, read
//!    from a file prepared once with `git ls-tree -r <merge_base>`.
//!
//! Paths absent at the merge-base are simply not re-added, so they end up
//! absent. The index filter never touches the working tree.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::traits::{CleanupOutcome, HistoryRewriter, RewriteError, RewriteRequest};
use crate::core::paths::TwinPaths;
use crate::git::process;

const TOOL: &str = "git-filter-branch";

/// Rewriter driving `git filter-branch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterBranch;

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

impl FilterBranch {
    /// Index filter script for `paths`, restoring entries from `index_info`.
    pub fn index_filter(paths: &[String], index_info: Option<&Path>) -> String {
        let quoted: Vec<String> = paths.iter().map(|p| shell_quote(p)).collect();
        let mut script = format!(
            "git rm --cached --ignore-unmatch -q -r -- {}",
            quoted.join(" ")
        );
        if let Some(info) = index_info {
            script.push_str(" && git update-index --index-info < ");
            script.push_str(&shell_quote(&info.to_string_lossy()));
        }
        script
    }

    fn git(work_dir: &Path, args: &[String]) -> Result<process::ProcessOutput, RewriteError> {
        process::run("git", args, work_dir, &[("FILTER_BRANCH_SQUELCH_WARNING", "1")]).map_err(
            |e| RewriteError::Spawn {
                tool: TOOL,
                message: e.to_string(),
            },
        )
    }

    /// Write the merge-base entries of `paths` to a scratch file.
    ///
    /// Returns `None` when none of the paths exist at the merge-base.
    fn prepare_index_info(
        request: &RewriteRequest<'_>,
    ) -> Result<Option<std::path::PathBuf>, RewriteError> {
        let mut args = vec![
            "ls-tree".to_string(),
            "-r".to_string(),
            request.merge_base.to_string(),
            "--".to_string(),
        ];
        args.extend(request.paths.iter().cloned());

        let out = Self::git(request.work_dir, &args)?;
        if !out.success() {
            return Err(RewriteError::ToolFailed {
                tool: TOOL,
                stderr: out.diagnostic().to_string(),
            });
        }
        if out.stdout.trim().is_empty() {
            return Ok(None);
        }

        let scratch = TwinPaths::new(request.git_dir).scratch_dir();
        fs::create_dir_all(&scratch).map_err(|source| RewriteError::Io {
            path: scratch.clone(),
            source,
        })?;
        let path = scratch.join("index-info");
        fs::write(&path, &out.stdout).map_err(|source| RewriteError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }

    fn remove_backup_refs(work_dir: &Path) -> Result<usize, String> {
        let list = Self::git(
            work_dir,
            &[
                "for-each-ref".to_string(),
                "--format=%(refname)".to_string(),
                "refs/original/".to_string(),
            ],
        )
        .map_err(|e| e.to_string())?;
        if !list.success() {
            return Err(list.diagnostic().to_string());
        }

        let mut removed = 0;
        for refname in list.stdout.lines().filter(|l| !l.is_empty()) {
            let out = Self::git(
                work_dir,
                &["update-ref".to_string(), "-d".to_string(), refname.to_string()],
            )
            .map_err(|e| e.to_string())?;
            if !out.success() {
                return Err(out.diagnostic().to_string());
            }
            removed += 1;
        }
        Ok(removed)
    }
}

impl HistoryRewriter for FilterBranch {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn ensure_available(&self, work_dir: &Path) -> Result<(), RewriteError> {
        match process::run("git", ["--version"], work_dir, &[]) {
            Ok(out) if out.success() => Ok(()),
            _ => Err(RewriteError::Unavailable {
                tool: TOOL,
                hint: "git is not runnable".to_string(),
            }),
        }
    }

    fn clear_state(&self, work_dir: &Path, git_dir: &Path) -> CleanupOutcome {
        let mut removed = false;

        let temp_dir = work_dir.join(".git-rewrite");
        if temp_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&temp_dir) {
                return CleanupOutcome::Failed(format!("{}: {}", temp_dir.display(), e));
            }
            removed = true;
        }

        match Self::remove_backup_refs(work_dir) {
            Ok(0) => {}
            Ok(n) => {
                debug!(count = n, "removed filter-branch backup refs");
                removed = true;
            }
            Err(e) => {
                let refs = TwinPaths::new(git_dir).filter_branch_backup_refs();
                return CleanupOutcome::Failed(format!("{}: {}", refs.display(), e));
            }
        }

        if removed {
            CleanupOutcome::Removed
        } else {
            CleanupOutcome::Absent
        }
    }

    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<(), RewriteError> {
        let index_info = Self::prepare_index_info(request)?;
        let script = Self::index_filter(request.paths, index_info.as_deref());

        let args = vec![
            "filter-branch".to_string(),
            "-f".to_string(),
            "--index-filter".to_string(),
            script,
            "--".to_string(),
            format!("{}..{}", request.merge_base, request.branch),
        ];
        debug!(command = %process::render("git", &args), "rewriting history");

        let out = Self::git(request.work_dir, &args)?;

        if let Some(info) = &index_info {
            if let Err(e) = fs::remove_file(info) {
                debug!(error = %e, "could not remove index-info scratch file");
            }
        }

        if !out.success() {
            return Err(RewriteError::ToolFailed {
                tool: TOOL,
                stderr: out.diagnostic().to_string(),
            });
        }

        // The backup points at the discarded pre-rewrite PR branch
        if let Err(e) = Self::remove_backup_refs(request.work_dir) {
            debug!(error = %e, "could not remove filter-branch backup refs");
        }
        Ok(())
    }
}
