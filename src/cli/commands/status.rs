//! cli::commands::status
//!
//! Show the current pair, its base and the managed paths.

use anyhow::Result;

use super::{emit, Workspace};
use crate::engine::{self, Context};
use crate::ui::output;

/// Run the status command.
pub fn status(ctx: &Context) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let report = engine::status(&workspace.session())?;

    emit(ctx, &report, |v| {
        output::print(format!("On {} branch '{}'", report.role, report.branch), v);
        let (label, other) = if report.role == "pr" {
            ("source", &report.source)
        } else {
            ("PR", &report.pr)
        };
        let state = if report.counterpart_exists {
            "exists"
        } else {
            "not created"
        };
        output::print(format!("{label} branch: {other} ({state})"), v);
        match (&report.base, &report.base_origin, &report.base_error) {
            (Some(base), Some(origin), _) => {
                output::print(format!("base: {base} (from {origin})"), v)
            }
            (_, _, Some(reason)) => output::print(format!("base: unresolved ({reason})"), v),
            _ => output::print("base: unresolved", v),
        }
        output::print(
            format!(
                "descriptor: {}",
                if report.initialized { "present" } else { "absent" }
            ),
            v,
        );
        output::print("managed paths:", v);
        output::print(output::format_list(&report.managed_paths, "  "), v);
        output::detail(format!("rewrite tool: {}", report.rewrite_tool), v);
    })
}
