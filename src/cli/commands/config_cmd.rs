//! config command - Get, set, or list repository configuration values
//!
//! Values are read from and written to `.git/twinbranch/config.toml`.
//! `list` also shows the effective value of every key, after global config
//! and defaults are applied.

use anyhow::{Context as _, Result};

use super::{verbosity, working_dir};
use crate::core::config::{Config, RepoConfig};
use crate::engine::{Context, WorkflowError};
use crate::git::{Git, VersionControl};
use crate::ui::output;

fn open(ctx: &Context) -> Result<(Git, Config)> {
    let git = Git::open(&working_dir(ctx)?).map_err(WorkflowError::from)?;
    let config = Config::load(Some(git.git_dir()))
        .context("Failed to load configuration")?
        .config;
    Ok((git, config))
}

/// Effective value of `key`, after precedence and defaults.
fn effective(config: &Config, key: &str) -> Option<String> {
    match key {
        "pattern" => Some(config.pattern().to_string()),
        "remote" => Some(config.remote().to_string()),
        "base" => config.base().map(str::to_string),
        "rewrite_tool" => Some(config.rewrite_tool().to_string()),
        "scan_limit" => Some(config.scan_limit().to_string()),
        "managed_files" => Some(config.managed_files().join(",")),
        _ => None,
    }
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let (_git, config) = open(ctx)?;

    // Reject unknown keys even when no repo config exists
    RepoConfig::default().get(key)?;

    if let Some(value) = effective(&config, key) {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let (git, config) = open(ctx)?;

    let mut repo = config.repo.unwrap_or_default();
    repo.set(key, value)?;
    let path = Config::write_repo(git.git_dir(), &repo).context("Failed to write config")?;

    output::print(
        format!("Set {} = {} in {}", key, value, path.display()),
        verbosity(ctx),
    );
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let (_git, config) = open(ctx)?;
    let repo = config.repo.clone().unwrap_or_default();

    if ctx.json {
        let mut map = serde_json::Map::new();
        for key in RepoConfig::KEYS {
            let value = effective(&config, key)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null);
            map.insert(key.to_string(), value);
        }
        output::json(&map).context("Failed to serialize output")?;
        return Ok(());
    }

    println!("# Repository Configuration");
    for key in RepoConfig::KEYS {
        let set_here = repo.get(key)?.is_some();
        match effective(&config, key) {
            Some(value) if set_here => println!("{} = {}", key, value),
            Some(value) => println!("{} = {} (default)", key, value),
            None => println!("{} = (not set)", key),
        }
    }
    match config.global_config_loaded_from() {
        Some(path) => println!("# global config: {}", path.display()),
        None => {
            if let Ok(path) = Config::global_config_path() {
                println!("# global config: none (create {})", path.display());
            }
        }
    }
    if let Some(dir) = config.templates_dir() {
        println!("# templates: {}", dir.display());
    }

    Ok(())
}
