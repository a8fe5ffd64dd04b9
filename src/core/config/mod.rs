//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! twinbranch has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TWINBRANCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/twinbranch/config.toml`
//! 3. `~/.twinbranch/config.toml` (canonical write location)
//!
//! # Environment
//!
//! All environment lookups happen in [`Config::load`]. The resulting
//! [`Config`] is passed by reference into the engine, which never reads the
//! environment itself.
//!
//! # Example
//!
//! ```no_run
//! use twinbranch::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Pattern: {}", config.pattern());
//! println!("Remote: {}", config.remote());
//! println!("Rewrite tool: {}", config.rewrite_tool());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig, RewriteTool};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::managed::default_managed_files;
use crate::core::paths::TwinPaths;
use crate::core::pattern::NamingPattern;

/// Default number of branches scanned for descriptor overrides.
pub const DEFAULT_SCAN_LIMIT: usize = 200;

/// Default remote.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Environment-derived inputs to loading.
///
/// Split out of [`Config::load`] so tests can load from explicit locations
/// without touching process environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Candidate global config files, first existing wins
    pub global_candidates: Vec<PathBuf>,
    /// `$TWINBRANCH_TEMPLATES`
    pub templates_override: Option<PathBuf>,
    /// Home directory, for the default templates location
    pub home: Option<PathBuf>,
}

impl ConfigSources {
    /// Collect sources from the process environment.
    pub fn from_env() -> Self {
        let mut global_candidates = Vec::new();
        if let Ok(path) = std::env::var("TWINBRANCH_CONFIG") {
            global_candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            global_candidates.push(PathBuf::from(xdg_home).join("twinbranch/config.toml"));
        }
        let home = dirs::home_dir();
        if let Some(home) = &home {
            global_candidates.push(home.join(".twinbranch/config.toml"));
        }

        Self {
            global_candidates,
            templates_override: std::env::var_os("TWINBRANCH_TEMPLATES").map(PathBuf::from),
            home,
        }
    }
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically. Repo config
/// overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
    /// Resolved templates directory
    templates_dir: Option<PathBuf>,
}

impl Config {
    /// Build a configuration directly from its scopes, without touching disk.
    pub fn from_parts(global: GlobalConfig, repo: Option<RepoConfig>) -> Self {
        Self {
            templates_dir: global.templates_dir.clone(),
            global,
            repo,
            ..Default::default()
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads repo-specific config from
    /// `<git_dir>/twinbranch/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(&ConfigSources::from_env(), git_dir)
    }

    /// Load configuration from explicit sources.
    pub fn load_from(
        sources: &ConfigSources,
        git_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = Self::load_global(sources)?;

        let (repo, repo_path) = match git_dir {
            Some(git_dir) => Self::load_repo(git_dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        let templates_dir = sources
            .templates_override
            .clone()
            .or_else(|| global.templates_dir.clone())
            .or_else(|| sources.home.as_ref().map(|h| h.join(".twinbranch/templates")));

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
                templates_dir,
            },
        })
    }

    /// Load global configuration from the first existing candidate.
    fn load_global(
        sources: &ConfigSources,
    ) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        for path in &sources.global_candidates {
            if path.exists() {
                let config = Self::read_toml(path)?;
                return Ok((config, Some(path.clone())));
            }
        }
        Ok((GlobalConfig::default(), None))
    }

    /// Load repository configuration.
    fn load_repo(git_dir: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = TwinPaths::new(git_dir).repo_config_path();
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Read and parse a TOML config file.
    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.twinbranch/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".twinbranch/config.toml"))
    }

    /// Write repo config atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_repo(git_dir: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = TwinPaths::new(git_dir).repo_config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Temp file in the same directory so the rename stays on one filesystem
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the naming pattern.
    ///
    /// Defaults to `%branch%--PR`.
    pub fn pattern(&self) -> NamingPattern {
        self.repo
            .as_ref()
            .and_then(|r| r.pattern.clone())
            .or_else(|| self.global.pattern.clone())
            .unwrap_or_default()
    }

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Get the repository default base branch.
    ///
    /// Returns `None` if not configured.
    pub fn base(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.base.as_deref())
    }

    /// Get the rewrite backend.
    ///
    /// Defaults to `filter-repo`.
    pub fn rewrite_tool(&self) -> RewriteTool {
        self.repo
            .as_ref()
            .and_then(|r| r.rewrite_tool)
            .or(self.global.rewrite_tool)
            .unwrap_or_default()
    }

    /// Get the branch scan limit for descriptor overrides.
    ///
    /// Defaults to 200.
    pub fn scan_limit(&self) -> usize {
        self.repo
            .as_ref()
            .and_then(|r| r.scan_limit)
            .unwrap_or(DEFAULT_SCAN_LIMIT)
    }

    /// Get the managed file set.
    ///
    /// Defaults to the built-in set.
    pub fn managed_files(&self) -> Vec<String> {
        self.repo
            .as_ref()
            .and_then(|r| r.managed_files.clone())
            .or_else(|| self.global.managed_files.clone())
            .unwrap_or_else(|| default_managed_files().into_iter().map(|f| f.path).collect())
    }

    /// Get the templates directory, if one could be determined.
    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_sources() -> ConfigSources {
        ConfigSources::default()
    }

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_from(&no_sources(), None).unwrap();
        let config = result.config;

        assert_eq!(config.pattern().as_str(), "%branch%--PR");
        assert_eq!(config.remote(), "origin");
        assert!(config.base().is_none());
        assert_eq!(config.rewrite_tool(), RewriteTool::FilterRepo);
        assert_eq!(config.scan_limit(), DEFAULT_SCAN_LIMIT);
        assert_eq!(
            config.managed_files(),
            vec!["AGENTS.md", "TASKS.md", ".agent.toml"]
        );
        assert!(config.templates_dir().is_none());
    }

    #[test]
    fn load_global_first_existing_candidate() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("config.toml");
        fs::write(
            &present,
            r#"
            rewrite_tool = "filter-branch"
            managed_files = ["CLAUDE.md"]
            "#,
        )
        .unwrap();

        let sources = ConfigSources {
            global_candidates: vec![temp.path().join("missing.toml"), present.clone()],
            ..Default::default()
        };
        let config = Config::load_from(&sources, None).unwrap().config;

        assert_eq!(config.rewrite_tool(), RewriteTool::FilterBranch);
        assert_eq!(config.managed_files(), vec!["CLAUDE.md"]);
        assert_eq!(config.global_config_loaded_from(), Some(present.as_path()));
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("twinbranch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            r#"
            base = "develop"
            remote = "upstream"
            scan_limit = 10
            "#,
        )
        .unwrap();

        let config = Config::load_from(&no_sources(), Some(temp.path()))
            .unwrap()
            .config;

        assert_eq!(config.base(), Some("develop"));
        assert_eq!(config.remote(), "upstream");
        assert_eq!(config.scan_limit(), 10);
        assert!(config.repo_config_loaded_from().is_some());
    }

    #[test]
    fn repo_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                pattern: Some(NamingPattern::parse("%branch%-global").unwrap()),
                rewrite_tool: Some(RewriteTool::FilterBranch),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                pattern: Some(NamingPattern::parse("%branch%-repo").unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(config.pattern().as_str(), "%branch%-repo");
        // Unset in repo, so global applies
        assert_eq!(config.rewrite_tool(), RewriteTool::FilterBranch);
    }

    #[test]
    fn templates_dir_precedence() {
        let mut sources = ConfigSources {
            home: Some(PathBuf::from("/home/dev")),
            ..Default::default()
        };
        let config = Config::load_from(&sources, None).unwrap().config;
        assert_eq!(
            config.templates_dir(),
            Some(Path::new("/home/dev/.twinbranch/templates"))
        );

        sources.templates_override = Some(PathBuf::from("/opt/templates"));
        let config = Config::load_from(&sources, None).unwrap().config;
        assert_eq!(config.templates_dir(), Some(Path::new("/opt/templates")));
    }

    #[test]
    fn write_repo_config_atomic() {
        let temp = TempDir::new().unwrap();

        let config = RepoConfig {
            base: Some("develop".to_string()),
            rewrite_tool: Some(RewriteTool::FilterBranch),
            ..Default::default()
        };

        let path = Config::write_repo(temp.path(), &config).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = Config::load_from(&no_sources(), Some(temp.path())).unwrap();
        assert_eq!(loaded.config.base(), Some("develop"));
        assert_eq!(loaded.config.rewrite_tool(), RewriteTool::FilterBranch);
    }

    #[test]
    fn invalid_base_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("twinbranch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "base = \"invalid..name\"").unwrap();

        assert!(Config::load_from(&no_sources(), Some(temp.path())).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("twinbranch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            r#"
            base = "main"
            trunk = "main"
            "#,
        )
        .unwrap();

        let result = Config::load_from(&no_sources(), Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
