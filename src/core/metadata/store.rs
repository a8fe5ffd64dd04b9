//! core::metadata::store
//!
//! Descriptor storage.
//!
//! # Architecture
//!
//! The descriptor is an ordinary tracked file, so it travels with the branch.
//! Reads come from one of two places:
//!
//! - the working tree, for the branch that is checked out
//! - a branch's committed snapshot, read as a blob through
//!   [`VersionControl::read_file_at`] without checking anything out
//!
//! Writes only touch the working tree; staging and committing belong to the
//! caller.
//!
//! # Advisory Reads
//!
//! [`MetadataStore::read`] never fails: malformed JSON, an unknown version or
//! a validation failure all read as "no descriptor", and the reason is logged
//! at debug level. [`MetadataStore::load`] is the strict variant used when the
//! user asked about the descriptor directly.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::schema::{parse_descriptor, Descriptor, MetadataError, METADATA_FILE};
use crate::core::types::BranchName;
use crate::git::{GitError, VersionControl};

/// Errors from descriptor storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the working-tree file failed.
    #[error("failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Git operation failed.
    #[error("git error: {0}")]
    GitError(#[from] GitError),

    /// Descriptor failed to parse or validate.
    #[error("metadata error: {0}")]
    MetadataError(#[from] MetadataError),
}

/// Path of the descriptor inside a working tree.
pub fn descriptor_path(root: &Path) -> PathBuf {
    root.join(METADATA_FILE)
}

/// Strictly read the working-tree descriptor under `root`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_worktree(root: &Path) -> Result<Option<Descriptor>, StoreError> {
    let path = descriptor_path(root);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::ReadError { path, source }),
    };
    Ok(Some(parse_descriptor(&json)?))
}

/// Write `descriptor` into the working tree under `root`.
///
/// Creates the file if absent and overwrites it otherwise.
pub fn write_descriptor(root: &Path, descriptor: &Descriptor) -> Result<PathBuf, MetadataError> {
    descriptor.validate()?;
    let path = descriptor_path(root);
    let json = descriptor.to_json()?;
    fs::write(&path, json).map_err(|source| MetadataError::WriteError {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Descriptor store bound to a repository.
///
/// # Example
///
/// ```ignore
/// let store = MetadataStore::new(&git);
///
/// // Checked-out branch
/// let current = store.read(None);
///
/// // Another branch, without checking it out
/// let other = store.read(Some(&BranchName::new("feature")?));
/// ```
pub struct MetadataStore<'a> {
    vcs: &'a dyn VersionControl,
}

impl<'a> MetadataStore<'a> {
    /// Create a store over the given repository.
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self { vcs }
    }

    /// Read a descriptor, treating every failure as absence.
    ///
    /// `None` for `branch` reads the working tree; `Some` reads the branch's
    /// committed snapshot.
    pub fn read(&self, branch: Option<&BranchName>) -> Option<Descriptor> {
        match self.load(branch) {
            Ok(found) => found,
            Err(e) => {
                let location = branch.map_or("working tree", |b| b.as_str());
                debug!(%location, error = %e, "ignoring unreadable descriptor");
                None
            }
        }
    }

    /// Read a descriptor strictly.
    ///
    /// # Errors
    ///
    /// Returns the parse, validation or git error instead of hiding it.
    pub fn load(&self, branch: Option<&BranchName>) -> Result<Option<Descriptor>, StoreError> {
        match branch {
            None => read_worktree(self.vcs.work_dir()),
            Some(branch) => match self.vcs.read_file_at(branch, METADATA_FILE)? {
                Some(json) => Ok(Some(parse_descriptor(&json)?)),
                None => Ok(None),
            },
        }
    }

    /// Write a descriptor into the working tree.
    pub fn write(&self, descriptor: &Descriptor) -> Result<PathBuf, MetadataError> {
        write_descriptor(self.vcs.work_dir(), descriptor)
    }

    /// Whether the working tree has a descriptor file, valid or not.
    pub fn exists_in_worktree(&self) -> bool {
        descriptor_path(self.vcs.work_dir()).exists()
    }
}
