//! engine::error
//!
//! Workflow errors and their categories.
//!
//! Every engine failure is a [`WorkflowError`]. Each variant belongs to one
//! [`ErrorCategory`], which decides the process exit code.
//!
//! | category    | exit |
//! |-------------|------|
//! | environment | 2    |
//! | resolution  | 3    |
//! | safety      | 4    |
//! | remote      | 5    |
//! | tool        | 6    |

use std::path::PathBuf;

use thiserror::Error;

use crate::core::metadata::MetadataError;
use crate::core::types::TypeError;
use crate::git::GitError;
use crate::rewrite::RewriteError;

/// Broad failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Repository, filesystem or tool installation problems.
    Environment,
    /// A branch, base or name could not be determined.
    Resolution,
    /// The operation was refused to protect the user's branches.
    Safety,
    /// The remote refused or could not be reached.
    Remote,
    /// An external tool ran and failed.
    Tool,
}

impl ErrorCategory {
    /// Process exit code for the category.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Environment => 2,
            ErrorCategory::Resolution => 3,
            ErrorCategory::Safety => 4,
            ErrorCategory::Remote => 5,
            ErrorCategory::Tool => 6,
        }
    }
}

/// Errors from engine workflows.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("base branch '{0}' does not exist")]
    BaseNotFound(String),

    #[error("base branch '{0}' is the source branch itself")]
    BaseIsSource(String),

    #[error("could not determine a base branch (tried: {tried}); pass one explicitly or run `twin base <branch>`")]
    NoBase { tried: String },

    #[error("'{source_branch}' and '{base}' have no common ancestor")]
    NoMergeBase { source_branch: String, base: String },

    #[error("PR branch name '{target}' is the same as the {role} branch")]
    TargetCollision { target: String, role: &'static str },

    #[error("'{current}' is the PR branch of '{source_branch}'; switch to '{source_branch}' or pass --force to treat '{current}' as a source")]
    OnPrBranch {
        current: String,
        source_branch: String,
    },

    #[error("cannot push from PR branch '{current}'; switch to '{source_branch}' first")]
    PushFromPr {
        current: String,
        source_branch: String,
    },

    #[error("'{0}' is already initialized; pass --force to re-initialize")]
    AlreadyInitialized(String),

    #[error("PR branch '{0}' does not exist, run `twin pr` first")]
    PrBranchMissing(String),

    #[error("source branch '{0}' does not exist")]
    SourceMissing(String),

    #[error("push of '{branch}' to '{remote}' was rejected; re-run with --force to overwrite the remote branch ({stderr})")]
    PushRejected {
        branch: String,
        remote: String,
        stderr: String,
    },

    #[error("push of '{branch}' to '{remote}' failed: {message}")]
    PushFailed {
        branch: String,
        remote: String,
        message: String,
    },

    #[error("merging '{pr}' into '{base}' failed and was aborted: {message}")]
    MergeFailed {
        pr: String,
        base: String,
        message: String,
    },

    #[error("template '{name}' not found at {}", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    #[error("no templates directory configured; set templates_dir or $TWINBRANCH_TEMPLATES")]
    NoTemplatesDir,

    #[error("failed to access '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl WorkflowError {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        use WorkflowError::*;
        match self {
            DetachedHead | Git(_) | Metadata(_) | TemplateNotFound { .. } | NoTemplatesDir
            | Io { .. } => ErrorCategory::Environment,
            Rewrite(RewriteError::ToolFailed { .. }) => ErrorCategory::Tool,
            Rewrite(_) => ErrorCategory::Environment,
            InvalidName(_)
            | BaseNotFound(_)
            | BaseIsSource(_)
            | NoBase { .. }
            | NoMergeBase { .. }
            | TargetCollision { .. }
            | PrBranchMissing(_)
            | SourceMissing(_) => ErrorCategory::Resolution,
            OnPrBranch { .. } | PushFromPr { .. } | AlreadyInitialized(_) => ErrorCategory::Safety,
            PushRejected { .. } | PushFailed { .. } => ErrorCategory::Remote,
            MergeFailed { .. } => ErrorCategory::Tool,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        WorkflowError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
