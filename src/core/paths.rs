//! core::paths
//!
//! Path routing for twinbranch storage locations.
//!
//! # Storage Layout
//!
//! twinbranch keeps its repository-scoped data under `<git_dir>/twinbranch/`:
//! - `config.toml` - Repository configuration
//! - `scratch/` - Transient inputs handed to the rewrite tool
//!
//! Rewrite tools leave their own state behind; those locations are routed
//! here too so cleanup and diagnostics agree on them.
//!
//! # Example
//!
//! ```
//! use twinbranch::core::paths::TwinPaths;
//! use std::path::PathBuf;
//!
//! let paths = TwinPaths::new("/repo/.git");
//!
//! assert_eq!(
//!     paths.repo_config_path(),
//!     PathBuf::from("/repo/.git/twinbranch/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Path routing for twinbranch storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinPaths {
    git_dir: PathBuf,
}

impl TwinPaths {
    /// Create paths rooted at a git directory.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// The git directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Root twinbranch directory: `<git_dir>/twinbranch`.
    pub fn repo_dir(&self) -> PathBuf {
        self.git_dir.join("twinbranch")
    }

    /// Repository configuration file: `<git_dir>/twinbranch/config.toml`.
    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_dir().join("config.toml")
    }

    /// Scratch directory for rewrite inputs: `<git_dir>/twinbranch/scratch`.
    pub fn scratch_dir(&self) -> PathBuf {
        self.repo_dir().join("scratch")
    }

    /// State left by `git filter-repo`: `<git_dir>/filter-repo`.
    pub fn filter_repo_state_dir(&self) -> PathBuf {
        self.git_dir.join("filter-repo")
    }

    /// Backup refs left by `git filter-branch`: `<git_dir>/refs/original`.
    pub fn filter_branch_backup_refs(&self) -> PathBuf {
        self.git_dir.join("refs/original")
    }
}
