//! engine::resolver
//!
//! Branch-pair resolution.
//!
//! Given the checked-out branch, decide whether it is a source branch or a
//! PR branch and name its counterpart. The first rule that applies wins:
//!
//! 1. The branch's own descriptor declares `emitBranch`: the branch is the
//!    source, the override is the PR branch.
//! 2. Another local branch's descriptor declares `emitBranch` naming this
//!    branch: this branch is the PR branch, that branch is the source. At
//!    most `scan_limit` other branches are read.
//! 3. The naming pattern: if the name inverts to a source name, this is the
//!    PR branch; otherwise it is the source and the PR name is derived.

use serde::Serialize;
use tracing::debug;

use super::WorkflowError;
use crate::core::metadata::MetadataStore;
use crate::core::pattern::NamingPattern;
use crate::core::types::BranchName;
use crate::git::VersionControl;

/// Which rule produced a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairOrigin {
    /// The current branch's own descriptor.
    OwnDescriptor,
    /// Another branch's descriptor, found by scanning.
    ScannedDescriptor,
    /// The naming pattern.
    Pattern,
}

/// A source branch and its PR branch, relative to the checked-out branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchPair {
    pub source: BranchName,
    pub pr: BranchName,
    /// Whether the checked-out branch is the PR branch.
    pub on_pr: bool,
    pub origin: PairOrigin,
}

impl BranchPair {
    /// The checked-out branch.
    pub fn current(&self) -> &BranchName {
        if self.on_pr {
            &self.pr
        } else {
            &self.source
        }
    }

    /// The other branch of the pair.
    pub fn counterpart(&self) -> &BranchName {
        if self.on_pr {
            &self.source
        } else {
            &self.pr
        }
    }
}

/// Resolve the pair for `current`.
///
/// # Errors
///
/// Fails only when the repository cannot be read or the derived PR name is
/// not a valid branch name.
pub fn resolve(
    vcs: &dyn VersionControl,
    current: &BranchName,
    pattern: &NamingPattern,
    scan_limit: usize,
) -> Result<BranchPair, WorkflowError> {
    let store = MetadataStore::new(vcs);

    // The checked-out branch is read from the working tree so an uncommitted
    // descriptor still counts.
    if let Some(emit) = store.read(None).and_then(|d| d.emit_branch) {
        if &emit != current {
            debug!(source = %current, pr = %emit, "pair from own descriptor");
            return Ok(BranchPair {
                source: current.clone(),
                pr: emit,
                on_pr: false,
                origin: PairOrigin::OwnDescriptor,
            });
        }
    }

    let others = vcs
        .list_branches()?
        .into_iter()
        .filter(|b| b != current)
        .take(scan_limit);
    for branch in others {
        let emits_current = store
            .read(Some(&branch))
            .and_then(|d| d.emit_branch)
            .is_some_and(|emit| &emit == current);
        if emits_current {
            debug!(source = %branch, pr = %current, "pair from scanned descriptor");
            return Ok(BranchPair {
                source: branch,
                pr: current.clone(),
                on_pr: true,
                origin: PairOrigin::ScannedDescriptor,
            });
        }
    }

    if let Some(source) = pattern.source_name(current.as_str()) {
        let source = BranchName::new(source)?;
        debug!(source = %source, pr = %current, "pair from pattern (on PR branch)");
        return Ok(BranchPair {
            source,
            pr: current.clone(),
            on_pr: true,
            origin: PairOrigin::Pattern,
        });
    }

    let pr = BranchName::new(pattern.pr_name(current.as_str()))?;
    debug!(source = %current, pr = %pr, "pair from pattern");
    Ok(BranchPair {
        source: current.clone(),
        pr,
        on_pr: false,
        origin: PairOrigin::Pattern,
    })
}
