//! core::managed
//!
//! Managed files: the agent-facing paths that live on source branches and
//! are reverted on PR branches.
//!
//! # Defaults
//!
//! | path          | purpose                       |
//! |---------------|-------------------------------|
//! | `AGENTS.md`   | agent instructions            |
//! | `TASKS.md`    | checkbox task list            |
//! | `.agent.toml` | agent / editor configuration  |
//!
//! The descriptor file ([`METADATA_FILE`]) is always managed, whatever the
//! configuration says.
//!
//! # File Listing
//!
//! Template directories are enumerated through the [`FileLister`] trait so the
//! engine never walks the filesystem itself. [`DirLister`] is the production
//! implementation.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::metadata::METADATA_FILE;

/// A project-relative file treated as agent-instruction content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFile {
    /// Repository-relative path using `/` separators.
    pub path: String,
    /// Content written by `init` when no template supplies the file.
    pub default_content: Option<&'static str>,
}

impl ManagedFile {
    /// A managed file without default content.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_content: None,
        }
    }
}

const AGENTS_DEFAULT: &str = "# Agent Instructions\n\n\
Describe the task, the constraints, and how to verify the work.\n";

const TASKS_DEFAULT: &str = "# Tasks\n\n- [ ] First task\n";

const AGENT_CONFIG_DEFAULT: &str = "# Agent configuration\n";

/// The built-in managed file set.
pub fn default_managed_files() -> Vec<ManagedFile> {
    vec![
        ManagedFile {
            path: "AGENTS.md".to_string(),
            default_content: Some(AGENTS_DEFAULT),
        },
        ManagedFile {
            path: "TASKS.md".to_string(),
            default_content: Some(TASKS_DEFAULT),
        },
        ManagedFile {
            path: ".agent.toml".to_string(),
            default_content: Some(AGENT_CONFIG_DEFAULT),
        },
    ]
}

/// Look up the built-in default content for a path, if it has any.
pub fn default_content_for(path: &str) -> Option<&'static str> {
    default_managed_files()
        .into_iter()
        .find(|f| f.path == path)
        .and_then(|f| f.default_content)
}

/// Check that `path` is a normalized repository-relative path.
///
/// Rejects empty, absolute, and parent-escaping paths, and paths with `.`
/// components or backslashes.
pub fn validate_relative_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".to_string());
    }
    if path.contains('\\') {
        return Err(format!("path '{path}' must use '/' separators"));
    }
    if path.ends_with('/') {
        return Err(format!("path '{path}' must name a file"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(format!("path '{path}' must be relative and normalized")),
        }
    }
    Ok(())
}

/// Union of path lists in first-seen order, always ending with the
/// descriptor file.
pub fn merge_paths<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut merged: Vec<String> = Vec::new();
    for list in lists {
        for path in list {
            if !merged.iter().any(|p| p == path) {
                merged.push(path.clone());
            }
        }
    }
    if !merged.iter().any(|p| p == METADATA_FILE) {
        merged.push(METADATA_FILE.to_string());
    }
    merged
}

/// Directory listing collaborator.
pub trait FileLister {
    /// List files under `root`, as paths relative to `root`, sorted.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`FileLister`] backed by a recursive directory walk.
///
/// Hidden directories such as `.git` are skipped; hidden files are kept,
/// since agent configuration commonly lives in dotfiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirLister;

impl FileLister for DirLister {
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = walkdir::WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}
