//! engine::init
//!
//! Inject managed files into a source branch.
//!
//! With a template, every file under `<templates_dir>/<name>` is copied into
//! the working tree. Without one, the configured managed files are created
//! with their built-in default content. Files that already exist are never
//! overwritten. The descriptor is always (re)written; committing is
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::base::resolve_base;
use super::{Session, WorkflowError};
use crate::core::managed::{default_content_for, validate_relative_path, FileLister};
use crate::core::metadata::{
    write_descriptor, Descriptor, MetadataStore, DEFAULT_TEMPLATE, METADATA_FILE,
};
use crate::core::types::BranchName;

/// Caller choices for init.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions<'a> {
    /// Template directory name under the templates dir.
    pub template: Option<&'a str>,
    /// Base branch recorded in the descriptor.
    pub base: Option<&'a str>,
    /// PR branch name recorded as the override.
    pub branch: Option<&'a str>,
    /// Stage and commit the injected files.
    pub commit: bool,
    /// Re-initialize, or initialize a PR-shaped branch.
    pub force: bool,
}

/// What init did.
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub branch: BranchName,
    pub template: String,
    /// Files written.
    pub created: Vec<String>,
    /// Files that already existed and were left alone.
    pub kept: Vec<String>,
    pub descriptor: PathBuf,
    pub committed: bool,
}

/// Initialize the checked-out branch.
pub fn init(
    session: &Session<'_>,
    lister: &dyn FileLister,
    options: InitOptions<'_>,
) -> Result<InitReport, WorkflowError> {
    let vcs = session.vcs;
    let pair = session.resolve_pair()?;
    let current = pair.current().clone();

    if pair.on_pr && !options.force && vcs.branch_exists(&pair.source)? {
        return Err(WorkflowError::OnPrBranch {
            current: current.to_string(),
            source_branch: pair.source.to_string(),
        });
    }
    if !options.force && MetadataStore::new(vcs).exists_in_worktree() {
        return Err(WorkflowError::AlreadyInitialized(current.to_string()));
    }

    let base = match options.base {
        Some(raw) => Some(resolve_base(vcs, session.config, &current, None, Some(raw))?.branch),
        None => None,
    };
    let emit = match options.branch {
        Some(raw) => {
            let emit = BranchName::new(raw)?;
            if emit == current {
                return Err(WorkflowError::TargetCollision {
                    target: emit.to_string(),
                    role: "source",
                });
            }
            Some(emit)
        }
        None => None,
    };

    let files = match options.template {
        Some(name) => template_files(session, lister, name)?,
        None => session
            .config
            .managed_files()
            .into_iter()
            .map(|path| {
                let content = default_content_for(&path).unwrap_or_default();
                (path, FileSource::Content(content))
            })
            .collect(),
    };

    let work_dir = vcs.work_dir();
    let mut created = Vec::new();
    let mut kept = Vec::new();
    let mut injected = Vec::new();
    for (path, source) in files {
        if path == METADATA_FILE {
            continue;
        }
        let dest = work_dir.join(&path);
        if dest.exists() {
            debug!(path = %path, "keeping existing file");
            kept.push(path.clone());
        } else {
            place(&dest, &source)?;
            created.push(path.clone());
        }
        injected.push(path);
    }

    let template = options.template.unwrap_or(DEFAULT_TEMPLATE).to_string();
    let descriptor = Descriptor::new(template.clone(), injected.clone())
        .with_base_branch(base)
        .with_emit_branch(emit);
    let descriptor_path = write_descriptor(work_dir, &descriptor)?;

    if options.commit {
        let mut paths = injected;
        paths.push(METADATA_FILE.to_string());
        vcs.stage_and_commit(&paths, "Add agent instruction files")?;
    }

    info!(branch = %current, template = %template, created = created.len(), "initialized branch");

    Ok(InitReport {
        branch: current,
        template,
        created,
        kept,
        descriptor: descriptor_path,
        committed: options.commit,
    })
}

enum FileSource {
    Copy(PathBuf),
    Content(&'static str),
}

fn template_files(
    session: &Session<'_>,
    lister: &dyn FileLister,
    name: &str,
) -> Result<Vec<(String, FileSource)>, WorkflowError> {
    let dir = session
        .config
        .templates_dir()
        .ok_or(WorkflowError::NoTemplatesDir)?
        .join(name);
    if !dir.is_dir() {
        return Err(WorkflowError::TemplateNotFound {
            name: name.to_string(),
            path: dir,
        });
    }

    let listed = lister
        .list_files(&dir)
        .map_err(|e| WorkflowError::io(&dir, e))?;
    let mut files = Vec::with_capacity(listed.len());
    for relative in listed {
        let path = slash_path(&relative);
        validate_relative_path(&path).map_err(|message| WorkflowError::Io {
            path: dir.join(&relative),
            message,
        })?;
        files.push((path, FileSource::Copy(dir.join(&relative))));
    }
    Ok(files)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn place(dest: &Path, source: &FileSource) -> Result<(), WorkflowError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| WorkflowError::io(parent, e))?;
    }
    match source {
        FileSource::Copy(from) => fs::copy(from, dest)
            .map(|_| ())
            .map_err(|e| WorkflowError::io(from, e)),
        FileSource::Content(content) => {
            fs::write(dest, content).map_err(|e| WorkflowError::io(dest, e))
        }
    }
}
