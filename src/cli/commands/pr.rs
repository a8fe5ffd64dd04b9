//! cli::commands::pr
//!
//! Create or refresh the PR branch and check it out.
//!
//! # Example
//!
//! ```bash
//! # feature -> feature--PR, base resolved automatically
//! twin pr
//!
//! # Explicit base and PR branch name
//! twin pr develop --branch publish/feature
//! ```

use anyhow::Result;

use super::{emit, Workspace};
use crate::engine::{self, Context, SynthesisOptions, SynthesisReport};
use crate::ui::output::{self, Verbosity};

/// Run the pr command.
///
/// # Arguments
///
/// * `ctx` - Engine context
/// * `base` - Explicit base branch
/// * `branch` - Explicit PR branch name
/// * `force` - Treat the current PR branch as a source
pub fn pr(ctx: &Context, base: Option<&str>, branch: Option<&str>, force: bool) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::pr(
        &workspace.session(),
        SynthesisOptions {
            base,
            branch,
            allow_pr_source: force,
        },
    )?;

    emit(ctx, &report, |v| {
        print_synthesis(&report, v);
        output::print(format!("Switched to '{}'", report.pr), v);
    })
}

/// Human-readable synthesis summary, shared with push.
pub(crate) fn print_synthesis(report: &SynthesisReport, v: Verbosity) {
    let verb = if report.replaced_existing {
        "Rebuilt"
    } else {
        "Created"
    };
    output::print(
        format!(
            "{verb} '{}' from '{}' against '{}' ({} commit{} rewritten)",
            report.pr,
            report.source,
            report.base,
            report.rewritten_commits,
            if report.rewritten_commits == 1 { "" } else { "s" }
        ),
        v,
    );
    output::detail(
        format!("base from {}, merge-base {}", report.base_origin, report.merge_base.short(7)),
        v,
    );
    output::detail(format!("managed paths: {}", report.paths.join(", ")), v);
}
