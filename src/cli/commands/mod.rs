//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository and loads configuration through [`Workspace`]
//! 2. Calls the engine
//! 3. Formats and displays output (text or JSON)
//!
//! Handlers do NOT perform repository mutations directly.

mod base;
mod completion;
mod config_cmd;
mod init;
mod merge;
mod pr;
mod push;
mod status;
mod switch;

pub use base::base;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use init::init;
pub use merge::merge;
pub use pr::pr;
pub use push::push;
pub use status::status;
pub use switch::switch;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::engine::{Context, Session, WorkflowError};
use crate::git::{Git, VersionControl};
use crate::rewrite::{self, HistoryRewriter};
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            template,
            base,
            branch,
            commit,
            force,
        } => init::init(
            ctx,
            template.as_deref(),
            base.as_deref(),
            branch.as_deref(),
            commit,
            force,
        ),
        Command::Pr {
            base,
            branch,
            force,
        } => pr::pr(ctx, base.as_deref(), branch.as_deref(), force),
        Command::Switch => switch::switch(ctx),
        Command::Push {
            base,
            branch,
            force,
            remote,
        } => push::push(
            ctx,
            base.as_deref(),
            branch.as_deref(),
            force,
            remote.as_deref(),
        ),
        Command::Merge { no_ff } => merge::merge(ctx, no_ff),
        Command::Base { branch } => base::base(ctx, branch.as_deref()),
        Command::Status => status::status(ctx),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Directory the command runs in.
pub(crate) fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(cwd) => Ok(cwd.clone()),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}

/// Output verbosity for the context.
pub(crate) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.silent, ctx.verbose)
}

/// An opened repository with its configuration and rewrite backend.
pub(crate) struct Workspace {
    pub git: Git,
    pub config: Config,
    pub rewriter: Box<dyn HistoryRewriter>,
}

impl Workspace {
    /// Open the repository containing the working directory.
    pub fn open(ctx: &Context) -> Result<Self> {
        let cwd = working_dir(ctx)?;
        let git = Git::open(&cwd).map_err(WorkflowError::from)?;
        let config = Config::load(Some(git.git_dir()))
            .context("Failed to load configuration")?
            .config;
        let rewriter = rewrite::for_tool(config.rewrite_tool());
        Ok(Self {
            git,
            config,
            rewriter,
        })
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(&self.git, self.rewriter.as_ref(), &self.config)
    }
}

/// Print `report` as JSON, or run `text` to print it for humans.
pub(crate) fn emit<T: Serialize>(ctx: &Context, report: &T, text: impl FnOnce(Verbosity)) -> Result<()> {
    if ctx.json {
        output::json(report).context("Failed to serialize output")?;
    } else {
        text(verbosity(ctx));
    }
    Ok(())
}
