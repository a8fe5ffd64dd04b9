//! cli::commands::switch
//!
//! Check out the other branch of the pair.

use anyhow::Result;

use super::{emit, Workspace};
use crate::engine::{self, Context};
use crate::ui::output;

/// Run the switch command.
pub fn switch(ctx: &Context) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::switch(&workspace.session())?;

    emit(ctx, &report, |v| {
        let role = if report.on_pr { "PR" } else { "source" };
        output::print(format!("Switched to {role} branch '{}'", report.to), v);
    })
}
