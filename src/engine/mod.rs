//! engine
//!
//! Branch-pair resolution, PR branch synthesis, and the workflows built on
//! them.
//!
//! # Architecture
//!
//! The engine consumes only the [`VersionControl`] and [`HistoryRewriter`]
//! traits plus an explicit [`Config`]. Everything it needs is bundled into a
//! [`Session`] by the CLI layer, so nothing below this point reads the
//! environment.
//!
//! ```text
//! resolver ─┐
//! base ─────┼─> synth ─> workflow (pr, switch, push, merge)
//! metadata ─┘            init, status, base show/set
//! ```
//!
//! # Invariants
//!
//! - The PR branch is always recreated from the source tip; a previous PR
//!   branch is never reused.
//! - Workflows that move between branches return to the starting branch,
//!   on success and on failure.
//! - Every failure is a [`WorkflowError`] with an [`ErrorCategory`].

pub mod base;
pub mod error;
pub mod guard;
pub mod init;
pub mod resolver;
pub mod status;
pub mod synth;
pub mod workflow;

pub use base::{resolve_base, BaseOrigin, ResolvedBase};
pub use error::{ErrorCategory, WorkflowError};
pub use guard::CheckoutGuard;
pub use init::{init, InitOptions, InitReport};
pub use resolver::{resolve, BranchPair, PairOrigin};
pub use status::{show_base, set_base, status, BaseReport, StatusReport};
pub use synth::{synthesize, SynthesisOptions, SynthesisReport};
pub use workflow::{merge, pr, push, switch, PushOptions, PushReport, MergeReport, SwitchReport};

use std::path::PathBuf;

use crate::core::config::Config;
use crate::core::types::BranchName;
use crate::git::VersionControl;
use crate::rewrite::HistoryRewriter;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Verbose diagnostics.
    pub verbose: bool,
    /// Errors only.
    pub silent: bool,
    /// Machine-readable output.
    pub json: bool,
}

/// Collaborators and configuration for one engine call.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub vcs: &'a dyn VersionControl,
    pub rewriter: &'a dyn HistoryRewriter,
    pub config: &'a Config,
}

impl<'a> Session<'a> {
    /// Bundle collaborators.
    pub fn new(
        vcs: &'a dyn VersionControl,
        rewriter: &'a dyn HistoryRewriter,
        config: &'a Config,
    ) -> Self {
        Self {
            vcs,
            rewriter,
            config,
        }
    }

    /// The checked-out branch; detached HEAD is an error.
    pub fn current_branch(&self) -> Result<BranchName, WorkflowError> {
        self.vcs
            .current_branch()?
            .ok_or(WorkflowError::DetachedHead)
    }

    /// Resolve the pair for the checked-out branch.
    pub fn resolve_pair(&self) -> Result<BranchPair, WorkflowError> {
        let current = self.current_branch()?;
        resolve(
            self.vcs,
            &current,
            &self.config.pattern(),
            self.config.scan_limit(),
        )
    }
}
