//! git::interface
//!
//! Production [`VersionControl`] implementation.
//!
//! # Architecture
//!
//! Reads go through `git2`: branch lookup, merge-base, revision walks, blob
//! reads and repository-local config never spawn a process. Mutations that
//! touch the working tree or the network (checkout, branch create/delete,
//! merge, push, commit) run the `git` CLI so hooks, credential helpers and
//! the user's git configuration apply exactly as they would by hand.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CommandFailed`]: A `git` subprocess exited non-zero
//! - [`GitError::Spawn`]: A subprocess could not be started
//!
//! # Example
//!
//! ```ignore
//! use twinbranch::git::{Git, VersionControl};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if let Some(branch) = git.current_branch()? {
//!     println!("on {} at {}", branch, git.branch_tip(&branch)?.short(7));
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::process::{self, ProcessOutput};
use super::traits::{PushOutcome, VersionControl};
use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// File content is not valid UTF-8.
    #[error("file is not valid UTF-8: {path}")]
    InvalidUtf8 {
        /// Path of the file inside the tree
        path: String,
    },

    /// A git subprocess exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Its stderr (or stdout when stderr was empty)
        stderr: String,
    },

    /// A subprocess could not be started.
    #[error("failed to run `{command}`: {message}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        /// OS error description
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Stderr fragments git prints when the remote refuses a non-fast-forward
/// update.
const REJECTION_MARKERS: &[&str] = &["[rejected]", "non-fast-forward", "fetch first"];

/// Interpret a finished `git push`.
///
/// Exit 0 is [`PushOutcome::Pushed`]; a non-fast-forward refusal is
/// [`PushOutcome::Rejected`]; anything else (unreachable remote, hook
/// rejection, authentication) is a [`GitError::CommandFailed`].
pub fn classify_push(command: String, output: &ProcessOutput) -> Result<PushOutcome, GitError> {
    if output.success() {
        return Ok(PushOutcome::Pushed);
    }
    let stderr = output.diagnostic();
    if REJECTION_MARKERS.iter().any(|m| stderr.contains(m)) {
        Ok(PushOutcome::Rejected {
            stderr: stderr.to_string(),
        })
    } else {
        Err(GitError::CommandFailed {
            command,
            stderr: stderr.to_string(),
        })
    }
}

/// The Git interface.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    work_dir: PathBuf,
    git_dir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("work_dir", &self.work_dir)
            .field("git_dir", &self.git_dir)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        let git_dir = repo.path().to_path_buf();
        debug!(work_dir = %work_dir.display(), "opened repository");

        Ok(Self {
            repo,
            work_dir,
            git_dir,
        })
    }

    // =========================================================================
    // Subprocess helpers
    // =========================================================================

    /// Run `git` in the working tree, returning the captured output.
    fn git(&self, args: &[&str]) -> Result<(String, ProcessOutput), GitError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let command = process::render("git", &owned);
        let output =
            process::run("git", &owned, &self.work_dir, &[]).map_err(|e| GitError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;
        Ok((command, output))
    }

    /// Run `git`, failing on non-zero exit.
    fn git_ok(&self, args: &[&str]) -> Result<ProcessOutput, GitError> {
        let (command, output) = self.git(args)?;
        if !output.success() {
            return Err(GitError::CommandFailed {
                command,
                stderr: output.diagnostic().to_string(),
            });
        }
        Ok(output)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    fn resolve_branch(&self, branch: &BranchName) -> Result<git2::Oid, GitError> {
        let refname = branch.ref_name();
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok(commit.id())
    }

    fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

impl VersionControl for Git {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    fn branch_exists(&self, branch: &BranchName) -> Result<bool, GitError> {
        match self.repo.find_branch(branch.as_str(), git2::BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(GitError::from_git2(e, &branch.ref_name())),
        }
    }

    fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self.repo.branches(Some(git2::BranchType::Local))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            if let Some(name) = branch.name().ok().flatten() {
                // Skip names this tool could not have created
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GitError> {
        let oid = self.resolve_branch(branch)?;
        Ok(Oid::new(oid.to_string())?)
    }

    fn merge_base(&self, a: &BranchName, b: &BranchName) -> Result<Option<Oid>, GitError> {
        let a = self.resolve_branch(a)?;
        let b = self.resolve_branch(b)?;

        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(Oid::new(oid.to_string())?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(Self::to_git2_oid(tip)?)?;
        revwalk.hide(Self::to_git2_oid(base)?)?;
        Ok(revwalk.count())
    }

    fn read_file_at(&self, branch: &BranchName, path: &str) -> Result<Option<String>, GitError> {
        let refname = branch.ref_name();
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let tree = reference
            .peel_to_tree()
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, path)),
        };

        let object = entry.to_object(&self.repo)?;
        let Some(blob) = object.as_blob() else {
            return Ok(None);
        };

        String::from_utf8(blob.content().to_vec())
            .map(Some)
            .map_err(|_| GitError::InvalidUtf8 {
                path: path.to_string(),
            })
    }

    fn create_branch(&self, name: &BranchName, start: &BranchName) -> Result<(), GitError> {
        self.git_ok(&["branch", name.as_str(), start.as_str()])?;
        Ok(())
    }

    fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        self.git_ok(&["branch", "-D", name.as_str()])?;
        Ok(())
    }

    fn checkout(&self, name: &BranchName) -> Result<(), GitError> {
        // Trailing "--" keeps git from reading the name as a path
        self.git_ok(&["checkout", name.as_str(), "--"])?;
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        let config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        let mut config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        config.set_str(key, value)?;
        Ok(())
    }

    fn remote_default_branch(&self, remote: &str) -> Result<Option<String>, GitError> {
        let refname = format!("refs/remotes/{remote}/HEAD");
        let reference = match self.repo.find_reference(&refname) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };

        let prefix = format!("refs/remotes/{remote}/");
        Ok(reference
            .symbolic_target()
            .and_then(|target| target.strip_prefix(&prefix))
            .map(str::to_string))
    }

    fn push(
        &self,
        remote: &str,
        branch: &BranchName,
        force: bool,
    ) -> Result<PushOutcome, GitError> {
        let mut args = vec!["push", "-u"];
        if force {
            args.push("--force");
        }
        args.push(remote);
        args.push(branch.as_str());

        let (command, output) = self.git(&args)?;
        classify_push(command, &output)
    }

    fn merge(&self, branch: &BranchName, no_ff: bool) -> Result<(), GitError> {
        let mut args = vec!["merge", "--no-edit"];
        if no_ff {
            args.push("--no-ff");
        }
        args.push(branch.as_str());
        self.git_ok(&args)?;
        Ok(())
    }

    fn merge_abort(&self) -> Result<(), GitError> {
        self.git_ok(&["merge", "--abort"])?;
        Ok(())
    }

    fn stage_and_commit(&self, paths: &[String], message: &str) -> Result<(), GitError> {
        let mut add = vec!["add", "--"];
        add.extend(paths.iter().map(String::as_str));
        self.git_ok(&add)?;

        let mut commit = vec!["commit", "-m", message, "--"];
        commit.extend(paths.iter().map(String::as_str));
        self.git_ok(&commit)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: i32, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    mod push_classification {
        use super::*;

        #[test]
        fn success_is_pushed() {
            let out = output(0, "To ../remote.git\n * [new branch] main--PR -> main--PR\n");
            assert_eq!(
                classify_push("git push".into(), &out).unwrap(),
                PushOutcome::Pushed
            );
        }

        #[test]
        fn non_fast_forward_is_rejected() {
            let out = output(
                1,
                " ! [rejected]        main--PR -> main--PR (non-fast-forward)\n\
                 error: failed to push some refs\n",
            );
            assert!(matches!(
                classify_push("git push".into(), &out).unwrap(),
                PushOutcome::Rejected { .. }
            ));
        }

        #[test]
        fn fetch_first_is_rejected() {
            let out = output(1, " ! [rejected]        x -> x (fetch first)\n");
            assert!(matches!(
                classify_push("git push".into(), &out),
                Ok(PushOutcome::Rejected { .. })
            ));
        }

        #[test]
        fn hook_rejection_is_failure() {
            let out = output(1, " ! [remote rejected] x -> x (pre-receive hook declined)\n");
            assert!(matches!(
                classify_push("git push".into(), &out),
                Err(GitError::CommandFailed { .. })
            ));
        }

        #[test]
        fn unreachable_remote_is_failure() {
            let out = output(128, "fatal: 'nowhere' does not appear to be a git repository\n");
            let err = classify_push("git push -u nowhere x".into(), &out).unwrap_err();
            assert!(err.to_string().contains("does not appear"));
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn type_error_maps() {
            let err: GitError = TypeError::InvalidOid("zz".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
            let err: GitError = TypeError::InvalidBranchName("..".into()).into();
            assert!(matches!(err, GitError::InvalidRefName { .. }));
        }

        #[test]
        fn command_failed_display() {
            let err = GitError::CommandFailed {
                command: "git checkout nope --".into(),
                stderr: "error: pathspec 'nope' did not match".into(),
            };
            assert_eq!(
                err.to_string(),
                "`git checkout nope --` failed: error: pathspec 'nope' did not match"
            );
        }
    }
}
