//! cli::commands::push
//!
//! Rebuild the PR branch, push it, and return to the source branch.
//!
//! A non-fast-forward rejection fails unless `--force` was given, in which
//! case the push is retried once with force.

use anyhow::Result;

use super::pr::print_synthesis;
use super::{emit, Workspace};
use crate::engine::{self, Context, PushOptions};
use crate::ui::output;

/// Run the push command.
pub fn push(
    ctx: &Context,
    base: Option<&str>,
    branch: Option<&str>,
    force: bool,
    remote: Option<&str>,
) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::push(
        &workspace.session(),
        PushOptions {
            base,
            branch,
            force,
            remote,
        },
    )?;

    emit(ctx, &report, |v| {
        print_synthesis(&report.synthesis, v);
        let how = if report.forced { " (forced)" } else { "" };
        output::print(
            format!("Pushed '{}' to '{}'{how}", report.synthesis.pr, report.remote),
            v,
        );
    })
}
