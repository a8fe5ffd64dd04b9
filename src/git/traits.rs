//! git::traits
//!
//! The version control collaborator consumed by the engine.
//!
//! # Design
//!
//! The engine never touches `git2` or the `git` CLI directly. Everything it
//! needs from the repository is a typed operation on [`VersionControl`], so
//! resolution and synthesis logic can run against the in-memory
//! [`MockRepo`](super::mock::MockRepo) in unit tests and against
//! [`Git`](super::Git) in production.

use std::path::Path;

use super::GitError;
use crate::core::types::{BranchName, Oid};

/// Result of a push attempt that reached the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The remote accepted the update.
    Pushed,
    /// The remote refused a non-fast-forward update.
    Rejected {
        /// Remote's explanation, verbatim.
        stderr: String,
    },
}

/// Version control operations the engine depends on.
///
/// Failures that are not part of an operation's normal outcome surface as
/// [`GitError`].
pub trait VersionControl {
    /// Root of the working tree.
    fn work_dir(&self) -> &Path;

    /// The repository's git directory.
    fn git_dir(&self) -> &Path;

    /// Checked-out branch, `None` when HEAD is detached or unborn.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    /// Whether a local branch exists.
    fn branch_exists(&self, branch: &BranchName) -> Result<bool, GitError>;

    /// All local branches, sorted by name.
    fn list_branches(&self) -> Result<Vec<BranchName>, GitError>;

    /// Commit a branch points at.
    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GitError>;

    /// Common ancestor of two branches, `None` when histories are unrelated.
    fn merge_base(&self, a: &BranchName, b: &BranchName) -> Result<Option<Oid>, GitError>;

    /// Number of commits reachable from `tip` but not from `base`.
    fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError>;

    /// Content of `path` in the branch's committed tree, `None` if absent.
    fn read_file_at(&self, branch: &BranchName, path: &str) -> Result<Option<String>, GitError>;

    /// Create `name` at the tip of `start` without checking it out.
    fn create_branch(&self, name: &BranchName, start: &BranchName) -> Result<(), GitError>;

    /// Force-delete a local branch.
    fn delete_branch(&self, name: &BranchName) -> Result<(), GitError>;

    /// Check out an existing local branch.
    fn checkout(&self, name: &BranchName) -> Result<(), GitError>;

    /// Read a repository-local config value.
    fn config_get(&self, key: &str) -> Result<Option<String>, GitError>;

    /// Write a repository-local config value.
    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError>;

    /// Branch the remote's HEAD points at, from `refs/remotes/<remote>/HEAD`.
    fn remote_default_branch(&self, remote: &str) -> Result<Option<String>, GitError>;

    /// Push `branch` to `remote`, setting upstream.
    ///
    /// A rejected update is [`PushOutcome::Rejected`]; any other failure is an
    /// error.
    fn push(&self, remote: &str, branch: &BranchName, force: bool)
        -> Result<PushOutcome, GitError>;

    /// Merge `branch` into the checked-out branch without opening an editor.
    fn merge(&self, branch: &BranchName, no_ff: bool) -> Result<(), GitError>;

    /// Abort an in-progress merge.
    fn merge_abort(&self) -> Result<(), GitError>;

    /// Stage `paths` and commit exactly those paths.
    fn stage_and_commit(&self, paths: &[String], message: &str) -> Result<(), GitError>;
}
