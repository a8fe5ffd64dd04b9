//! engine::workflow
//!
//! The pr, switch, push and merge workflows.
//!
//! Workflows that leave the starting branch hold a [`CheckoutGuard`], so
//! the user ends up where they started whether the workflow succeeds or
//! fails. `pr` and `switch` are the exceptions: moving the user is their
//! purpose.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::base::{resolve_base, BaseOrigin};
use super::guard::CheckoutGuard;
use super::synth::{synthesize, SynthesisOptions, SynthesisReport};
use super::{Session, WorkflowError};
use crate::core::metadata::MetadataStore;
use crate::core::types::BranchName;
use crate::git::PushOutcome;

/// Synthesize the PR branch and check it out.
pub fn pr(
    session: &Session<'_>,
    options: SynthesisOptions<'_>,
) -> Result<SynthesisReport, WorkflowError> {
    let report = synthesize(session, options)?;
    session.vcs.checkout(&report.pr)?;
    Ok(report)
}

/// Result of a switch.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchReport {
    pub from: BranchName,
    pub to: BranchName,
    /// Whether the branch now checked out is the PR branch.
    pub on_pr: bool,
}

/// Check out the other branch of the pair. Never creates branches.
pub fn switch(session: &Session<'_>) -> Result<SwitchReport, WorkflowError> {
    let pair = session.resolve_pair()?;
    let target = pair.counterpart().clone();

    if !session.vcs.branch_exists(&target)? {
        return Err(if pair.on_pr {
            WorkflowError::SourceMissing(target.to_string())
        } else {
            WorkflowError::PrBranchMissing(target.to_string())
        });
    }

    session.vcs.checkout(&target)?;
    debug!(from = %pair.current(), to = %target, "switched");
    Ok(SwitchReport {
        from: pair.current().clone(),
        to: target,
        on_pr: !pair.on_pr,
    })
}

/// Caller choices for a push.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions<'a> {
    /// Explicit base branch.
    pub base: Option<&'a str>,
    /// Explicit PR branch name.
    pub branch: Option<&'a str>,
    /// Overwrite the remote branch if the push is rejected.
    pub force: bool,
    /// Remote to push to, instead of the configured one.
    pub remote: Option<&'a str>,
}

/// Result of a push.
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub synthesis: SynthesisReport,
    pub remote: String,
    /// Whether the push needed `--force`.
    pub forced: bool,
}

/// Synthesize the PR branch from the current source and push it.
///
/// A rejected push is retried once with force, and only when
/// [`PushOptions::force`] is set.
pub fn push(
    session: &Session<'_>,
    options: PushOptions<'_>,
) -> Result<PushReport, WorkflowError> {
    let vcs = session.vcs;
    let pair = session.resolve_pair()?;
    if pair.on_pr && vcs.branch_exists(&pair.source)? {
        return Err(WorkflowError::PushFromPr {
            current: pair.pr.to_string(),
            source_branch: pair.source.to_string(),
        });
    }

    let guard = CheckoutGuard::new(vcs, pair.current().clone());

    let synthesis = synthesize(
        session,
        SynthesisOptions {
            base: options.base,
            branch: options.branch,
            allow_pr_source: false,
        },
    )?;

    let remote = options
        .remote
        .unwrap_or_else(|| session.config.remote())
        .to_string();
    let branch = &synthesis.pr;

    let forced = match vcs
        .push(&remote, branch, false)
        .map_err(|e| push_failed(branch, &remote, e.to_string()))?
    {
        PushOutcome::Pushed => false,
        PushOutcome::Rejected { stderr } if !options.force => {
            return Err(WorkflowError::PushRejected {
                branch: branch.to_string(),
                remote: remote.clone(),
                stderr,
            });
        }
        PushOutcome::Rejected { .. } => {
            warn!(branch = %branch, remote = %remote, "push rejected, retrying with --force");
            match vcs
                .push(&remote, branch, true)
                .map_err(|e| push_failed(branch, &remote, e.to_string()))?
            {
                PushOutcome::Pushed => true,
                PushOutcome::Rejected { stderr } => {
                    return Err(push_failed(branch, &remote, stderr));
                }
            }
        }
    };

    guard.finish()?;
    info!(branch = %branch, remote = %remote, forced, "pushed PR branch");

    Ok(PushReport {
        synthesis,
        remote,
        forced,
    })
}

fn push_failed(branch: &BranchName, remote: &str, message: String) -> WorkflowError {
    WorkflowError::PushFailed {
        branch: branch.to_string(),
        remote: remote.to_string(),
        message,
    }
}

/// Result of a merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub source: BranchName,
    pub pr: BranchName,
    pub base: BranchName,
    pub base_origin: BaseOrigin,
    pub no_ff: bool,
}

/// Merge the PR branch into its base, then return to the starting branch.
///
/// The base is resolved without persisting a binding. A failed merge is
/// aborted before the error is returned.
pub fn merge(session: &Session<'_>, no_ff: bool) -> Result<MergeReport, WorkflowError> {
    let vcs = session.vcs;
    let pair = session.resolve_pair()?;

    if !vcs.branch_exists(&pair.pr)? {
        return Err(WorkflowError::PrBranchMissing(pair.pr.to_string()));
    }

    let store = MetadataStore::new(vcs);
    let descriptor = if pair.on_pr {
        store.read(Some(&pair.source))
    } else {
        store.read(None)
    };
    let base = resolve_base(
        vcs,
        session.config,
        &pair.source,
        descriptor.as_ref(),
        None,
    )?;
    if base.branch == pair.pr {
        return Err(WorkflowError::TargetCollision {
            target: pair.pr.to_string(),
            role: "base",
        });
    }

    let guard = CheckoutGuard::new(vcs, pair.current().clone());
    vcs.checkout(&base.branch)?;

    if let Err(e) = vcs.merge(&pair.pr, no_ff) {
        if let Err(abort) = vcs.merge_abort() {
            warn!(error = %abort, "could not abort merge");
        }
        return Err(WorkflowError::MergeFailed {
            pr: pair.pr.to_string(),
            base: base.branch.to_string(),
            message: e.to_string(),
        });
    }

    guard.finish()?;
    info!(pr = %pair.pr, base = %base.branch, "merged PR branch");

    Ok(MergeReport {
        source: pair.source,
        pr: pair.pr,
        base: base.branch,
        base_origin: base.origin,
        no_ff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::git::mock::{FailOn, MockOperation, MockRepo};
    use crate::rewrite::mock::RecordingRewriter;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        repo: MockRepo,
        rewriter: RecordingRewriter,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let repo = MockRepo::new(temp.path());
            repo.add_branch("main");
            repo.branch_from("feature", "main");
            repo.commit("feature");
            repo.set_current("feature");
            Self {
                _temp: temp,
                repo,
                rewriter: RecordingRewriter::new(),
                config: Config::default(),
            }
        }

        fn session(&self) -> Session<'_> {
            Session::new(&self.repo, &self.rewriter, &self.config)
        }
    }

    #[test]
    fn pr_lands_on_pr_branch() {
        let fx = Fixture::new();
        let report = pr(&fx.session(), SynthesisOptions::default()).unwrap();
        assert_eq!(report.pr.as_str(), "feature--PR");
        assert_eq!(fx.repo.current().as_deref(), Some("feature--PR"));
    }

    #[test]
    fn switch_twice_returns_to_start() {
        let fx = Fixture::new();
        pr(&fx.session(), SynthesisOptions::default()).unwrap();

        let first = switch(&fx.session()).unwrap();
        assert_eq!(first.to.as_str(), "feature");
        assert!(!first.on_pr);

        let second = switch(&fx.session()).unwrap();
        assert_eq!(second.to.as_str(), "feature--PR");
        assert!(second.on_pr);
        assert_eq!(fx.repo.current().as_deref(), Some("feature--PR"));
    }

    #[test]
    fn switch_never_creates() {
        let fx = Fixture::new();
        let err = switch(&fx.session()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PR branch 'feature--PR' does not exist, run `twin pr` first"
        );
        assert!(fx.repo.operations().is_empty());
    }

    #[test]
    fn switch_from_pr_without_source() {
        let fx = Fixture::new();
        fx.repo.branch_from("gone--PR", "main");
        fx.repo.set_current("gone--PR");

        let err = switch(&fx.session()).unwrap_err();
        assert!(matches!(err, WorkflowError::SourceMissing(_)));
    }

    #[test]
    fn push_returns_to_source() {
        let fx = Fixture::new();
        let report = push(&fx.session(), PushOptions::default()).unwrap();

        assert_eq!(report.remote, "origin");
        assert!(!report.forced);
        assert_eq!(fx.repo.current().as_deref(), Some("feature"));
        assert!(fx.repo.operations().contains(&MockOperation::Push {
            remote: "origin".into(),
            branch: "feature--PR".into(),
            force: false,
        }));
    }

    #[test]
    fn push_refused_on_pr_branch() {
        let fx = Fixture::new();
        fx.repo.branch_from("feature--PR", "feature");
        fx.repo.set_current("feature--PR");

        let err = push(&fx.session(), PushOptions::default()).unwrap_err();
        assert!(matches!(err, WorkflowError::PushFromPr { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rejected_push_without_force_fails() {
        let fx = Fixture::new();
        fx.repo.queue_push_outcome(PushOutcome::Rejected {
            stderr: "! [rejected] feature--PR -> feature--PR (non-fast-forward)".into(),
        });

        let err = push(&fx.session(), PushOptions::default()).unwrap_err();
        assert!(matches!(err, WorkflowError::PushRejected { .. }));
        assert_eq!(fx.repo.current().as_deref(), Some("feature"));
    }

    #[test]
    fn rejected_push_with_force_retries_once() {
        let fx = Fixture::new();
        fx.repo.queue_push_outcome(PushOutcome::Rejected {
            stderr: "non-fast-forward".into(),
        });

        let report = push(
            &fx.session(),
            PushOptions {
                force: true,
                remote: Some("upstream"),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(report.forced);

        let pushes: Vec<_> = fx
            .repo
            .operations()
            .into_iter()
            .filter(|op| matches!(op, MockOperation::Push { .. }))
            .collect();
        assert_eq!(
            pushes,
            vec![
                MockOperation::Push {
                    remote: "upstream".into(),
                    branch: "feature--PR".into(),
                    force: false,
                },
                MockOperation::Push {
                    remote: "upstream".into(),
                    branch: "feature--PR".into(),
                    force: true,
                },
            ]
        );
    }

    #[test]
    fn push_failure_leaves_source_checked_out() {
        let fx = Fixture::new();
        fx.repo.fail_on(FailOn::Push);

        let err = push(&fx.session(), PushOptions::default()).unwrap_err();
        assert!(matches!(err, WorkflowError::PushFailed { .. }));
        assert_eq!(err.exit_code(), 5);
        assert_eq!(fx.repo.current().as_deref(), Some("feature"));
    }

    #[test]
    fn merge_returns_to_start() {
        let fx = Fixture::new();
        synthesize(&fx.session(), SynthesisOptions::default()).unwrap();

        let report = merge(&fx.session(), true).unwrap();
        assert_eq!(report.base.as_str(), "main");
        assert!(report.no_ff);
        assert_eq!(fx.repo.current().as_deref(), Some("feature"));

        let ops = fx.repo.operations();
        assert!(ops.contains(&MockOperation::Checkout {
            branch: "main".into()
        }));
        assert!(ops.contains(&MockOperation::Merge {
            branch: "feature--PR".into(),
            no_ff: true
        }));
    }

    #[test]
    fn merge_requires_pr_branch() {
        let fx = Fixture::new();
        let err = merge(&fx.session(), false).unwrap_err();
        assert!(matches!(err, WorkflowError::PrBranchMissing(_)));
    }

    #[test]
    fn failed_merge_is_aborted() {
        let fx = Fixture::new();
        synthesize(&fx.session(), SynthesisOptions::default()).unwrap();
        fx.repo.fail_on(FailOn::Merge);

        let err = merge(&fx.session(), false).unwrap_err();
        assert!(matches!(err, WorkflowError::MergeFailed { .. }));
        assert!(fx.repo.operations().contains(&MockOperation::MergeAbort));
        assert_eq!(fx.repo.current().as_deref(), Some("feature"));
    }

    #[test]
    fn merge_from_pr_branch() {
        let fx = Fixture::new();
        pr(&fx.session(), SynthesisOptions::default()).unwrap();

        let report = merge(&fx.session(), false).unwrap();
        assert_eq!(report.source.as_str(), "feature");
        assert_eq!(fx.repo.current().as_deref(), Some("feature--PR"));
    }
}
