//! cli::commands::init
//!
//! Inject agent instruction files into the current branch.

use anyhow::Result;

use super::{emit, Workspace};
use crate::core::managed::DirLister;
use crate::engine::{self, Context, InitOptions};
use crate::ui::output;

/// Run the init command.
///
/// # Arguments
///
/// * `ctx` - Engine context
/// * `template` - Template name under the templates dir
/// * `base` - Base branch to record
/// * `branch` - PR branch override to record
/// * `commit` - Commit the injected files
/// * `force` - Re-initialize
pub fn init(
    ctx: &Context,
    template: Option<&str>,
    base: Option<&str>,
    branch: Option<&str>,
    commit: bool,
    force: bool,
) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::init(
        &workspace.session(),
        &DirLister,
        InitOptions {
            template,
            base,
            branch,
            commit,
            force,
        },
    )?;

    emit(ctx, &report, |v| {
        output::print(
            format!(
                "Initialized '{}' from template '{}'",
                report.branch, report.template
            ),
            v,
        );
        for path in &report.created {
            output::print(format!("  created {path}"), v);
        }
        for path in &report.kept {
            output::print(format!("  kept    {path}"), v);
        }
        if report.committed {
            output::print("Committed injected files", v);
        } else {
            output::print("Review and commit the injected files when ready", v);
        }
    })
}
