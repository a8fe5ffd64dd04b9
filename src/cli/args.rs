//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--verbose` / `-v`: Show diagnostics
//! - `--silent` / `-s`: Errors only
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// twin - keep agent instruction files on your branch, publish clean PR branches
#[derive(Parser, Debug)]
#[command(name = "twin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if twin was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Show diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inject agent instruction files into the current branch
    #[command(
        name = "init",
        long_about = "Inject agent instruction files into the current branch.\n\n\
            Without --template, the configured managed files are created with \
            default content. With --template, every file of that template \
            directory is copied. Existing files are never overwritten. A \
            .twinbranch.json descriptor records what was injected.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Create AGENTS.md, TASKS.md and .agent.toml with default content
    twin init

    # Copy ~/.twinbranch/templates/claude into the branch and commit it
    twin init --template claude --commit

    # Record the base branch and a custom PR branch name
    twin init --base develop --branch feature-clean"
    )]
    Init {
        /// Template directory name under the templates dir
        #[arg(long, short)]
        template: Option<String>,

        /// Base branch to record in the descriptor
        #[arg(long)]
        base: Option<String>,

        /// PR branch name to record, overriding the naming pattern
        #[arg(long)]
        branch: Option<String>,

        /// Stage and commit the injected files
        #[arg(long)]
        commit: bool,

        /// Re-initialize an initialized branch, or initialize a PR branch
        #[arg(long)]
        force: bool,
    },

    /// Create or refresh the PR branch and check it out
    #[command(
        name = "pr",
        long_about = "Create or refresh the PR branch and check it out.\n\n\
            The PR branch is recreated from the current branch. Every commit \
            since the merge-base with the base branch is rewritten so managed \
            files keep their base content. Earlier commits keep their hashes.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Build feature--PR from feature against the resolved base
    twin pr

    # Against an explicit base
    twin pr develop

    # Custom PR branch name
    twin pr --branch publish/feature"
    )]
    Pr {
        /// Base branch (defaults to the stored binding, descriptor, config, remote default)
        base: Option<String>,

        /// PR branch name
        #[arg(long)]
        branch: Option<String>,

        /// Treat the current PR branch as a source
        #[arg(long)]
        force: bool,
    },

    /// Check out the other branch of the pair
    Switch,

    /// Refresh the PR branch, push it, and return to the source branch
    #[command(
        name = "push",
        after_help = "\
WORKFLOW EXAMPLES:
    # Rebuild and push feature--PR to origin
    twin push

    # Overwrite a remote PR branch that has diverged
    twin push --force"
    )]
    Push {
        /// Base branch
        base: Option<String>,

        /// PR branch name
        #[arg(long)]
        branch: Option<String>,

        /// Force-push if the remote rejects the push
        #[arg(long)]
        force: bool,

        /// Remote to push to
        #[arg(long)]
        remote: Option<String>,
    },

    /// Merge the PR branch into its base and return
    Merge {
        /// Always create a merge commit
        #[arg(long)]
        no_ff: bool,
    },

    /// Show or set the base branch of the current pair
    Base {
        /// New base branch
        branch: Option<String>,
    },

    /// Show the current pair, base and managed files
    Status,

    /// Get, set, or list repository configuration values
    #[command(
        name = "config",
        long_about = "View or modify twinbranch configuration.\n\n\
            Repository configuration is stored in .git/twinbranch/config.toml. \
            Keys: pattern, remote, base, rewrite_tool, scan_limit, managed_files.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Use a prefix pattern
    twin config set pattern 'publish/%branch%'

    # Use git filter-branch instead of git filter-repo
    twin config set rewrite_tool filter-branch

    # Manage a custom file set
    twin config set managed_files CLAUDE.md,notes/agent.md"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    twin completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    twin completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
