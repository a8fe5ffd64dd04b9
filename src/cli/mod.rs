//! cli
//!
//! Command-line interface layer for twinbranch.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds the
//! [`crate::engine::Context`], and dispatches to handlers that open the
//! repository, load configuration once, and call the [`crate::engine`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Build the execution context from parsed flags.
pub fn context(cli: &Cli) -> engine::Context {
    engine::Context {
        cwd: cli.cwd.clone(),
        verbose: cli.verbose,
        silent: cli.silent,
        json: cli.json,
    }
}

/// Run a parsed command line.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = context(&cli);
    commands::dispatch(cli.command, &ctx)
}
