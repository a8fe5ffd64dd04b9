//! engine::synth
//!
//! PR branch synthesis.
//!
//! # Pipeline
//!
//! 1. Resolve the pair for the checked-out branch.
//! 2. Refuse to treat a PR branch as a source unless explicitly allowed.
//! 3. Resolve the base branch.
//! 4. Check the rewrite tool is available, before anything is modified.
//! 5. Compute the merge-base of source and base.
//! 6. Delete any existing PR branch and recreate it from the source tip.
//! 7. Clear leftover rewrite state, then rewrite `merge_base..pr` so the
//!    managed paths keep their merge-base content.
//! 8. Persist the base binding.
//!
//! The PR branch is never checked out here. A PR branch left half-rewritten
//! by a failed run is simply deleted and recreated by the next one.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::base::{resolve_base, write_binding, BaseOrigin};
use super::resolver::resolve;
use super::{Session, WorkflowError};
use crate::core::managed::merge_paths;
use crate::core::metadata::MetadataStore;
use crate::core::types::{BranchName, Oid};
use crate::rewrite::{CleanupOutcome, RewriteRequest};

/// Caller choices for one synthesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthesisOptions<'a> {
    /// Explicit base branch.
    pub base: Option<&'a str>,
    /// Explicit PR branch name.
    pub branch: Option<&'a str>,
    /// Treat a PR branch as a source.
    pub allow_pr_source: bool,
}

/// What a synthesis did.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisReport {
    pub source: BranchName,
    pub pr: BranchName,
    pub base: BranchName,
    pub base_origin: BaseOrigin,
    pub merge_base: Oid,
    /// Commits rewritten (commits on the PR branch after the merge-base).
    pub rewritten_commits: usize,
    /// Managed paths reverted.
    pub paths: Vec<String>,
    /// Whether an earlier PR branch was replaced.
    pub replaced_existing: bool,
    /// Whether the base binding was written.
    pub binding_updated: bool,
}

/// Synthesize the PR branch for the checked-out branch.
pub fn synthesize(
    session: &Session<'_>,
    options: SynthesisOptions<'_>,
) -> Result<SynthesisReport, WorkflowError> {
    let vcs = session.vcs;
    let current = session.current_branch()?;
    let pattern = session.config.pattern();
    let pair = resolve(vcs, &current, &pattern, session.config.scan_limit())?;

    let (source, pair_pr) = if pair.on_pr {
        let source_exists = vcs.branch_exists(&pair.source)?;
        if source_exists && !options.allow_pr_source {
            return Err(WorkflowError::OnPrBranch {
                current: current.to_string(),
                source_branch: pair.source.to_string(),
            });
        }
        debug!(branch = %current, source_exists, "using PR-shaped branch as source");
        let pr = BranchName::new(pattern.pr_name(current.as_str()))?;
        (current.clone(), pr)
    } else {
        (pair.source, pair.pr)
    };

    // The source is the checked-out branch from here on
    let descriptor = MetadataStore::new(vcs).read(None);

    let base = resolve_base(
        vcs,
        session.config,
        &source,
        descriptor.as_ref(),
        options.base,
    )?;

    session.rewriter.ensure_available(vcs.work_dir())?;

    let merge_base = vcs.merge_base(&source, &base.branch)?.ok_or_else(|| {
        WorkflowError::NoMergeBase {
            source_branch: source.to_string(),
            base: base.branch.to_string(),
        }
    })?;

    let pr = match options.branch {
        Some(raw) => BranchName::new(raw)?,
        None => pair_pr,
    };
    if pr == source {
        return Err(WorkflowError::TargetCollision {
            target: pr.to_string(),
            role: "source",
        });
    }
    if pr == base.branch {
        return Err(WorkflowError::TargetCollision {
            target: pr.to_string(),
            role: "base",
        });
    }

    let replaced_existing = vcs.branch_exists(&pr)?;
    if replaced_existing {
        if vcs.current_branch()?.as_ref() == Some(&pr) {
            vcs.checkout(&source)?;
        }
        debug!(branch = %pr, "deleting previous PR branch");
        vcs.delete_branch(&pr)?;
    }
    vcs.create_branch(&pr, &source)?;

    let configured = session.config.managed_files();
    let injected = descriptor
        .as_ref()
        .map(|d| d.injected_files.clone())
        .unwrap_or_default();
    let paths = merge_paths([configured.as_slice(), injected.as_slice()]);

    match session.rewriter.clear_state(vcs.work_dir(), vcs.git_dir()) {
        CleanupOutcome::Removed => debug!(tool = session.rewriter.name(), "removed leftover rewrite state"),
        CleanupOutcome::Absent => {}
        CleanupOutcome::Failed(reason) => {
            warn!(tool = session.rewriter.name(), %reason, "could not remove leftover rewrite state")
        }
    }

    let tip = vcs.branch_tip(&pr)?;
    let rewritten_commits = vcs.commit_count(&merge_base, &tip)?;
    if rewritten_commits == 0 {
        debug!(branch = %pr, "no commits after merge-base, skipping rewrite");
    } else {
        session.rewriter.rewrite(&RewriteRequest {
            work_dir: vcs.work_dir(),
            git_dir: vcs.git_dir(),
            merge_base: &merge_base,
            branch: &pr,
            paths: &paths,
        })?;
    }

    let binding_updated = write_binding(vcs, &source, &base.branch)?;

    info!(
        source = %source,
        pr = %pr,
        base = %base.branch,
        commits = rewritten_commits,
        "synthesized PR branch"
    );

    Ok(SynthesisReport {
        source,
        pr,
        base: base.branch,
        base_origin: base.origin,
        merge_base,
        rewritten_commits,
        paths,
        replaced_existing,
        binding_updated,
    })
}
