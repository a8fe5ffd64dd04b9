//! rewrite::traits
//!
//! The history rewriter collaborator.
//!
//! # Contract
//!
//! A rewriter receives a branch, a merge-base and a list of repository
//! paths. It rewrites every commit in `merge_base..branch` so that, in each
//! rewritten commit, those paths have exactly the content they had at the
//! merge-base, or are absent if they were absent there. Commits reachable
//! from the merge-base are untouched and keep their hashes. The branch does
//! not need to be checked out.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid};

/// Errors from history rewriting.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The tool is not installed or not runnable.
    #[error("{tool} is not available: {hint}")]
    Unavailable {
        /// Tool name
        tool: &'static str,
        /// What the user can do about it
        hint: String,
    },

    /// The tool ran and exited non-zero.
    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        /// Tool name
        tool: &'static str,
        /// Tool stderr, verbatim
        stderr: String,
    },

    /// The tool could not be started.
    #[error("failed to run {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: &'static str,
        /// OS error description
        message: String,
    },

    /// Preparing tool input failed.
    #[error("failed to prepare '{path}': {source}")]
    Io {
        /// File being prepared
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Result of best-effort removal of a rewriter's leftover state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// State from an earlier run was found and removed.
    Removed,
    /// Nothing to remove.
    Absent,
    /// Removal failed; the rewrite may still succeed.
    Failed(String),
}

/// One rewrite invocation.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
    /// Working tree root; tools run here.
    pub work_dir: &'a Path,
    /// Git directory, for scratch files.
    pub git_dir: &'a Path,
    /// Exclusive lower bound of the rewritten range.
    pub merge_base: &'a Oid,
    /// Branch whose commits after `merge_base` are rewritten.
    pub branch: &'a BranchName,
    /// Paths reverted to their merge-base state.
    pub paths: &'a [String],
}

/// A history rewrite backend.
pub trait HistoryRewriter {
    /// Tool name, for messages.
    fn name(&self) -> &'static str;

    /// Check the tool can run, before any branch is touched.
    fn ensure_available(&self, work_dir: &Path) -> Result<(), RewriteError>;

    /// Remove state a previous, possibly interrupted, run left behind.
    ///
    /// Never fails; problems are reported through the outcome.
    fn clear_state(&self, work_dir: &Path, git_dir: &Path) -> CleanupOutcome;

    /// Rewrite the requested range.
    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<(), RewriteError>;
}
