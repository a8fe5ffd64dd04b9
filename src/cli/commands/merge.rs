//! cli::commands::merge
//!
//! Merge the PR branch into its base.

use anyhow::Result;

use super::{emit, Workspace};
use crate::engine::{self, Context};
use crate::ui::output;

/// Run the merge command.
///
/// # Arguments
///
/// * `ctx` - Engine context
/// * `no_ff` - Always create a merge commit
pub fn merge(ctx: &Context, no_ff: bool) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::merge(&workspace.session(), no_ff)?;

    emit(ctx, &report, |v| {
        output::print(format!("Merged '{}' into '{}'", report.pr, report.base), v);
        output::detail(format!("base from {}", report.base_origin), v);
    })
}
