//! twinbranch - keep agent instruction files on your working branch and
//! publish clean PR branches without them.
//!
//! A source branch carries agent-facing files (instructions, task lists,
//! agent configuration). Its PR branch is synthesized from it with every
//! commit since the merge-base rewritten so those files keep the content
//! they had on the base branch.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Pair resolution, PR branch synthesis, workflows
//! - [`core`] - Domain types, naming patterns, descriptors, configuration
//! - [`git`] - The version control collaborator
//! - [`rewrite`] - The history rewriter collaborator
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. `extract_source_name(make_pr_name(b, p), p) == b` for every valid pattern
//! 2. Commits at or before the merge-base are never rewritten
//! 3. A PR branch is always rebuilt from scratch, never patched
//! 4. Workflows that leave the starting branch return to it, even on failure

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod rewrite;
pub mod ui;
