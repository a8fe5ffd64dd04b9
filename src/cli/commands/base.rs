//! cli::commands::base
//!
//! Show or set the base branch of the current pair.

use anyhow::Result;

use super::{emit, Workspace};
use crate::engine::{self, Context};
use crate::ui::output;

/// Run the base command.
///
/// Without `branch`, prints the resolved base; with it, stores the binding.
pub fn base(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let session = workspace.session();

    match branch {
        None => {
            let report = engine::show_base(&session)?;
            emit(ctx, &report, |v| {
                output::print(&report.base, v);
                output::detail(format!("from {}", report.origin), v);
            })
        }
        Some(raw) => {
            let report = engine::set_base(&session, raw)?;
            emit(ctx, &report, |v| {
                output::print(
                    format!("Base of '{}' set to '{}'", report.source, report.base),
                    v,
                );
                if report.descriptor_updated {
                    output::print("Updated baseBranch in .twinbranch.json; commit it to share", v);
                }
            })
        }
    }
}
