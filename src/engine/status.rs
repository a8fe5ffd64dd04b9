//! engine::status
//!
//! Read-only pair inspection, and showing or setting the base binding.

use serde::Serialize;
use tracing::debug;

use super::base::{resolve_base, write_binding, BaseOrigin};
use super::resolver::{BranchPair, PairOrigin};
use super::{Session, WorkflowError};
use crate::core::managed::merge_paths;
use crate::core::metadata::{write_descriptor, Descriptor, MetadataStore};
use crate::core::types::BranchName;

/// Snapshot of the checked-out branch's pair.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub branch: BranchName,
    /// `"source"` or `"pr"`.
    pub role: &'static str,
    pub source: BranchName,
    pub pr: BranchName,
    pub pair_origin: PairOrigin,
    pub counterpart_exists: bool,
    pub base: Option<BranchName>,
    pub base_origin: Option<BaseOrigin>,
    /// Why no base could be resolved.
    pub base_error: Option<String>,
    pub managed_paths: Vec<String>,
    /// Whether the source branch carries a descriptor.
    pub initialized: bool,
    pub rewrite_tool: String,
}

/// The source branch's descriptor, read from the working tree when the
/// source is checked out.
fn source_descriptor(session: &Session<'_>, pair: &BranchPair) -> Option<Descriptor> {
    let store = MetadataStore::new(session.vcs);
    if pair.on_pr {
        store.read(Some(&pair.source))
    } else {
        store.read(None)
    }
}

/// Describe the checked-out branch. A base that cannot be resolved is
/// reported, not raised.
pub fn status(session: &Session<'_>) -> Result<StatusReport, WorkflowError> {
    let pair = session.resolve_pair()?;
    let vcs = session.vcs;
    let descriptor = source_descriptor(session, &pair);

    let counterpart_exists = vcs.branch_exists(pair.counterpart())?;
    let (base, base_origin, base_error) = if vcs.branch_exists(&pair.source)? {
        match resolve_base(vcs, session.config, &pair.source, descriptor.as_ref(), None) {
            Ok(resolved) => (Some(resolved.branch), Some(resolved.origin), None),
            Err(e) => (None, None, Some(e.to_string())),
        }
    } else {
        (
            None,
            None,
            Some(format!("source branch '{}' does not exist", pair.source)),
        )
    };

    let configured = session.config.managed_files();
    let injected = descriptor
        .as_ref()
        .map(|d| d.injected_files.clone())
        .unwrap_or_default();
    let managed_paths = merge_paths([configured.as_slice(), injected.as_slice()]);

    Ok(StatusReport {
        branch: pair.current().clone(),
        role: if pair.on_pr { "pr" } else { "source" },
        source: pair.source.clone(),
        pr: pair.pr.clone(),
        pair_origin: pair.origin,
        counterpart_exists,
        base,
        base_origin,
        base_error,
        managed_paths,
        initialized: descriptor.is_some(),
        rewrite_tool: session.config.rewrite_tool().to_string(),
    })
}

/// A base branch shown or set.
#[derive(Debug, Clone, Serialize)]
pub struct BaseReport {
    pub source: BranchName,
    pub base: BranchName,
    pub origin: BaseOrigin,
    pub binding_updated: bool,
    pub descriptor_updated: bool,
}

/// Resolve the base of the pair's source branch without persisting it.
pub fn show_base(session: &Session<'_>) -> Result<BaseReport, WorkflowError> {
    let pair = session.resolve_pair()?;
    let descriptor = source_descriptor(session, &pair);
    let resolved = resolve_base(
        session.vcs,
        session.config,
        &pair.source,
        descriptor.as_ref(),
        None,
    )?;
    Ok(BaseReport {
        source: pair.source,
        base: resolved.branch,
        origin: resolved.origin,
        binding_updated: false,
        descriptor_updated: false,
    })
}

/// Bind the pair's source branch to `raw`.
///
/// When the source is checked out and has a descriptor, its `baseBranch` is
/// updated too; the change is left for the user to commit.
pub fn set_base(session: &Session<'_>, raw: &str) -> Result<BaseReport, WorkflowError> {
    let pair = session.resolve_pair()?;
    let vcs = session.vcs;
    let resolved = resolve_base(vcs, session.config, &pair.source, None, Some(raw))?;
    let binding_updated = write_binding(vcs, &pair.source, &resolved.branch)?;

    let mut descriptor_updated = false;
    if !pair.on_pr {
        if let Some(mut descriptor) = MetadataStore::new(vcs).read(None) {
            if descriptor.base_branch.as_ref() != Some(&resolved.branch) {
                descriptor.base_branch = Some(resolved.branch.clone());
                write_descriptor(vcs.work_dir(), &descriptor)?;
                descriptor_updated = true;
                debug!(base = %resolved.branch, "updated descriptor baseBranch");
            }
        }
    }

    Ok(BaseReport {
        source: pair.source,
        base: resolved.branch,
        origin: resolved.origin,
        binding_updated,
        descriptor_updated,
    })
}
