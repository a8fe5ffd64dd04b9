//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$TWINBRANCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/twinbranch/config.toml`
//! 3. `~/.twinbranch/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<git_dir>/twinbranch/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: patterns must be invertible,
//! base must be a valid branch name, managed files must be normalized
//! relative paths.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::managed::validate_relative_path;
use crate::core::pattern::NamingPattern;
use crate::core::types::BranchName;

/// History rewrite backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteTool {
    /// `git filter-repo` (separate install)
    #[default]
    FilterRepo,
    /// `git filter-branch` (ships with git)
    FilterBranch,
}

impl RewriteTool {
    /// Accepted spellings, for error messages.
    pub const NAMES: &'static [&'static str] = &["filter-repo", "filter-branch"];

    /// The config spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteTool::FilterRepo => "filter-repo",
            RewriteTool::FilterBranch => "filter-branch",
        }
    }
}

impl fmt::Display for RewriteTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewriteTool {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filter-repo" => Ok(RewriteTool::FilterRepo),
            "filter-branch" => Ok(RewriteTool::FilterBranch),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid rewrite tool '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// pattern = "%branch%--PR"
/// rewrite_tool = "filter-repo"
/// templates_dir = "/home/me/.twinbranch/templates"
/// managed_files = ["AGENTS.md", "TASKS.md"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default naming pattern
    pub pattern: Option<NamingPattern>,

    /// Default rewrite backend
    pub rewrite_tool: Option<RewriteTool>,

    /// Directory holding named templates
    pub templates_dir: Option<PathBuf>,

    /// Default managed file set
    pub managed_files: Option<Vec<String>>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(files) = &self.managed_files {
            validate_managed_files(files)?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// pattern = "publish/%branch%"
/// remote = "origin"
/// base = "main"
/// rewrite_tool = "filter-branch"
/// scan_limit = 200
/// managed_files = ["AGENTS.md", "TASKS.md", ".agent.toml"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Naming pattern
    pub pattern: Option<NamingPattern>,

    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Repository default base branch
    pub base: Option<String>,

    /// Rewrite backend
    pub rewrite_tool: Option<RewriteTool>,

    /// Maximum branches scanned for descriptor overrides
    pub scan_limit: Option<usize>,

    /// Managed file set
    pub managed_files: Option<Vec<String>>,
}

impl RepoConfig {
    /// Keys accepted by [`RepoConfig::get`] and [`RepoConfig::set`].
    pub const KEYS: &'static [&'static str] = &[
        "pattern",
        "remote",
        "base",
        "rewrite_tool",
        "scan_limit",
        "managed_files",
    ];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.base {
            BranchName::new(base).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid base branch name: {}", e))
            })?;
        }

        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        if self.scan_limit == Some(0) {
            return Err(ConfigError::InvalidValue(
                "scan_limit must be at least 1".to_string(),
            ));
        }

        if let Some(files) = &self.managed_files {
            validate_managed_files(files)?;
        }

        Ok(())
    }

    /// Read a key as its display string.
    ///
    /// Returns `Ok(None)` for a known key that is unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "pattern" => self.pattern.as_ref().map(|p| p.to_string()),
            "remote" => self.remote.clone(),
            "base" => self.base.clone(),
            "rewrite_tool" => self.rewrite_tool.map(|t| t.to_string()),
            "scan_limit" => self.scan_limit.map(|n| n.to_string()),
            "managed_files" => self.managed_files.as_ref().map(|f| f.join(",")),
            other => return Err(unknown_key(other)),
        };
        Ok(value)
    }

    /// Parse and assign a key from its string form.
    ///
    /// `managed_files` takes a comma separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "pattern" => {
                let pattern = NamingPattern::parse(value)
                    .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
                self.pattern = Some(pattern);
            }
            "remote" => self.remote = Some(value.to_string()),
            "base" => self.base = Some(value.to_string()),
            "rewrite_tool" => self.rewrite_tool = Some(value.parse()?),
            "scan_limit" => {
                let n = value.parse::<usize>().map_err(|_| {
                    ConfigError::InvalidValue(format!("scan_limit must be a number, got '{value}'"))
                })?;
                self.scan_limit = Some(n);
            }
            "managed_files" => {
                let files = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                self.managed_files = Some(files);
            }
            other => return Err(unknown_key(other)),
        }
        self.validate()
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown config key '{}', expected one of: {}",
        key,
        RepoConfig::KEYS.join(", ")
    ))
}

fn validate_managed_files(files: &[String]) -> Result<(), ConfigError> {
    for path in files {
        validate_relative_path(path)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid managed file: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.pattern.is_none());
            assert!(config.rewrite_tool.is_none());
            assert!(config.templates_dir.is_none());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                pattern: Some(NamingPattern::parse("review/%branch%").unwrap()),
                rewrite_tool: Some(RewriteTool::FilterBranch),
                templates_dir: Some(PathBuf::from("/tmp/templates")),
                managed_files: Some(vec!["AGENTS.md".to_string()]),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }

        #[test]
        fn ambiguous_pattern_rejected_at_parse() {
            let result: Result<GlobalConfig, _> = toml::from_str(r#"pattern = "%branch%%branch%""#);
            assert!(result.is_err());
        }

        #[test]
        fn absolute_managed_file_rejected() {
            let config = GlobalConfig {
                managed_files: Some(vec!["/etc/hosts".to_string()]),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = RepoConfig::default();
            assert!(config.base.is_none());
            assert!(config.remote.is_none());
        }

        #[test]
        fn invalid_base() {
            let config = RepoConfig {
                base: Some("invalid..name".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn empty_remote_rejected() {
            let config = RepoConfig {
                remote: Some("".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn zero_scan_limit_rejected() {
            let config = RepoConfig {
                scan_limit: Some(0),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn rewrite_tool_kebab_case() {
            let parsed: RepoConfig = toml::from_str(r#"rewrite_tool = "filter-branch""#).unwrap();
            assert_eq!(parsed.rewrite_tool, Some(RewriteTool::FilterBranch));

            let result: Result<RepoConfig, _> = toml::from_str(r#"rewrite_tool = "bfg""#);
            assert!(result.is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                base = "main"
                unknown_field = true
            "#;

            let result: Result<RepoConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }

        #[test]
        fn set_and_get() {
            let mut config = RepoConfig::default();
            config.set("pattern", "%branch%-pub").unwrap();
            config.set("scan_limit", "50").unwrap();
            config.set("managed_files", "AGENTS.md, docs/notes.md").unwrap();
            config.set("rewrite_tool", "filter-branch").unwrap();

            assert_eq!(config.get("pattern").unwrap().as_deref(), Some("%branch%-pub"));
            assert_eq!(config.get("scan_limit").unwrap().as_deref(), Some("50"));
            assert_eq!(
                config.get("managed_files").unwrap().as_deref(),
                Some("AGENTS.md,docs/notes.md")
            );
            assert_eq!(
                config.get("rewrite_tool").unwrap().as_deref(),
                Some("filter-branch")
            );
            assert_eq!(config.get("base").unwrap(), None);
        }

        #[test]
        fn set_rejects_bad_values() {
            let mut config = RepoConfig::default();
            assert!(config.set("pattern", "%branch%").is_err());
            assert!(config.set("scan_limit", "lots").is_err());
            assert!(config.set("rewrite_tool", "bfg").is_err());
            assert!(config.set("colour", "blue").is_err());
            assert!(config.get("colour").is_err());
        }
    }
}
