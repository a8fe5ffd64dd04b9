//! engine::base
//!
//! Base branch resolution and the persisted base binding.
//!
//! # Fallback Chain
//!
//! The first candidate that exists locally wins:
//!
//! 1. explicit argument (must exist, must differ from the source)
//! 2. binding in git config `branch.<source>.twinbranchBase`
//! 3. descriptor `baseBranch`
//! 4. repo config `base`
//! 5. the remote's default branch (`refs/remotes/<remote>/HEAD`)
//! 6. `main`, `master`, `develop`, `trunk`
//!
//! Automatic candidates equal to the source branch are skipped. When nothing
//! resolves, the error lists every candidate that was tried.

use serde::Serialize;
use tracing::debug;

use super::WorkflowError;
use crate::core::config::Config;
use crate::core::metadata::Descriptor;
use crate::core::types::BranchName;
use crate::git::VersionControl;

/// Conventional base names, in preference order.
pub const CONVENTIONAL_BASES: &[&str] = &["main", "master", "develop", "trunk"];

/// Where a base branch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseOrigin {
    Explicit,
    Binding,
    Descriptor,
    RepoConfig,
    RemoteHead,
    Conventional,
}

impl std::fmt::Display for BaseOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BaseOrigin::Explicit => "argument",
            BaseOrigin::Binding => "binding",
            BaseOrigin::Descriptor => "descriptor",
            BaseOrigin::RepoConfig => "repo config",
            BaseOrigin::RemoteHead => "remote default",
            BaseOrigin::Conventional => "conventional name",
        };
        f.write_str(s)
    }
}

/// A resolved base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBase {
    pub branch: BranchName,
    pub origin: BaseOrigin,
}

/// Git config key holding the binding for `source`.
pub fn binding_key(source: &BranchName) -> String {
    format!("branch.{source}.twinbranchBase")
}

/// Read the stored binding for `source`.
pub fn read_binding(
    vcs: &dyn VersionControl,
    source: &BranchName,
) -> Result<Option<String>, WorkflowError> {
    Ok(vcs.config_get(&binding_key(source))?)
}

/// Store the binding unless it already holds `base`.
///
/// Returns whether anything was written.
pub fn write_binding(
    vcs: &dyn VersionControl,
    source: &BranchName,
    base: &BranchName,
) -> Result<bool, WorkflowError> {
    if read_binding(vcs, source)?.as_deref() == Some(base.as_str()) {
        return Ok(false);
    }
    vcs.config_set(&binding_key(source), base.as_str())?;
    debug!(source = %source, base = %base, "stored base binding");
    Ok(true)
}

/// Resolve the base branch for `source`.
///
/// `descriptor` is the source branch's descriptor, if it has one.
pub fn resolve_base(
    vcs: &dyn VersionControl,
    config: &Config,
    source: &BranchName,
    descriptor: Option<&Descriptor>,
    explicit: Option<&str>,
) -> Result<ResolvedBase, WorkflowError> {
    if let Some(raw) = explicit {
        let branch = BranchName::new(raw)?;
        if &branch == source {
            return Err(WorkflowError::BaseIsSource(raw.to_string()));
        }
        if !vcs.branch_exists(&branch)? {
            return Err(WorkflowError::BaseNotFound(raw.to_string()));
        }
        return Ok(ResolvedBase {
            branch,
            origin: BaseOrigin::Explicit,
        });
    }

    let mut candidates: Vec<(String, BaseOrigin)> = Vec::new();
    if let Some(bound) = read_binding(vcs, source)? {
        candidates.push((bound, BaseOrigin::Binding));
    }
    if let Some(base) = descriptor.and_then(|d| d.base_branch.as_ref()) {
        candidates.push((base.to_string(), BaseOrigin::Descriptor));
    }
    if let Some(base) = config.base() {
        candidates.push((base.to_string(), BaseOrigin::RepoConfig));
    }
    if let Some(head) = vcs.remote_default_branch(config.remote())? {
        candidates.push((head, BaseOrigin::RemoteHead));
    }
    candidates.extend(
        CONVENTIONAL_BASES
            .iter()
            .map(|n| (n.to_string(), BaseOrigin::Conventional)),
    );

    let mut tried = Vec::new();
    for (raw, origin) in candidates {
        let Ok(branch) = BranchName::new(raw.as_str()) else {
            debug!(candidate = %raw, %origin, "skipping invalid base candidate");
            tried.push(raw);
            continue;
        };
        if &branch == source {
            continue;
        }
        if vcs.branch_exists(&branch)? {
            debug!(base = %branch, %origin, "resolved base");
            return Ok(ResolvedBase { branch, origin });
        }
        if !tried.contains(&raw) {
            tried.push(raw);
        }
    }

    Err(WorkflowError::NoBase {
        tried: tried.join(", "),
    })
}
