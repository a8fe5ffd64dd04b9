//! rewrite
//!
//! History rewrite backends.
//!
//! # Modules
//!
//! - [`traits`] - The `HistoryRewriter` contract
//! - [`filter_repo`] - `git filter-repo` (default)
//! - [`filter_branch`] - `git filter-branch` (ships with git)
//! - [`mock`] - Recording double for tests
//!
//! The engine treats the rewrite tool as a black box with a known contract;
//! it never implements history rewriting itself.

pub mod filter_branch;
pub mod filter_repo;
pub mod mock;
pub mod traits;

pub use filter_branch::FilterBranch;
pub use filter_repo::FilterRepo;
pub use traits::{CleanupOutcome, HistoryRewriter, RewriteError, RewriteRequest};

use crate::core::config::RewriteTool;

/// Construct the backend selected by configuration.
pub fn for_tool(tool: RewriteTool) -> Box<dyn HistoryRewriter> {
    match tool {
        RewriteTool::FilterRepo => Box::new(FilterRepo),
        RewriteTool::FilterBranch => Box::new(FilterBranch),
    }
}
