//! core::pattern
//!
//! Mapping between source branch names and PR branch names.
//!
//! # Pattern Syntax
//!
//! A pattern contains at most one [`PLACEHOLDER`]. The text before it is the
//! prefix, the text after it is the suffix. A pattern without the placeholder
//! is a pure suffix.
//!
//! | pattern           | source    | PR branch            |
//! |-------------------|-----------|----------------------|
//! | `%branch%--PR`    | `main`    | `main--PR`           |
//! | `publish/%branch%`| `feat/x`  | `publish/feat/x`     |
//! | `-clean`          | `feat`    | `feat-clean`         |
//!
//! All functions here are pure; no repository access happens in this module.
//!
//! # Example
//!
//! ```
//! use twinbranch::core::pattern::{extract_source_name, make_pr_name};
//!
//! let pattern = "%branch%--PR";
//! assert_eq!(make_pr_name("main", pattern), "main--PR");
//! assert_eq!(extract_source_name("main--PR", pattern).as_deref(), Some("main"));
//! assert_eq!(extract_source_name("main", pattern), None);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token substituted with the source branch name.
pub const PLACEHOLDER: &str = "%branch%";

/// Pattern used when nothing is configured.
pub const DEFAULT_PATTERN: &str = "%branch%--PR";

/// Errors from pattern validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{0}' contains the {PLACEHOLDER} placeholder more than once")]
    Ambiguous(String),

    #[error("pattern '{0}' maps every branch to itself; add a prefix or suffix")]
    Identity(String),
}

/// Split a pattern into `(prefix, suffix)`.
///
/// Returns `None` when the placeholder appears more than once.
fn split(pattern: &str) -> Option<(&str, &str)> {
    match pattern.matches(PLACEHOLDER).count() {
        0 => Some(("", pattern)),
        1 => pattern.split_once(PLACEHOLDER),
        _ => None,
    }
}

/// Derive the PR branch name for `source`.
///
/// Substitutes the placeholder, or appends the pattern when it has none.
/// This never fails; whether the result is a valid branch name is checked by
/// the caller.
pub fn make_pr_name(source: &str, pattern: &str) -> String {
    if pattern.contains(PLACEHOLDER) {
        pattern.replace(PLACEHOLDER, source)
    } else {
        format!("{source}{pattern}")
    }
}

/// Recover the source branch name from a PR branch name.
///
/// Returns `None` when the pattern is ambiguous, the candidate does not carry
/// the pattern's prefix and suffix, or the source segment would be empty.
pub fn extract_source_name(candidate: &str, pattern: &str) -> Option<String> {
    let (prefix, suffix) = split(pattern)?;

    // Strictly longer keeps the middle segment non-empty and stops prefix and
    // suffix from overlapping.
    if candidate.len() <= prefix.len() + suffix.len() {
        return None;
    }

    let middle = candidate.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if middle.is_empty() {
        return None;
    }

    Some(middle.to_string())
}

/// Check whether `candidate` has the shape of a PR branch under `pattern`.
pub fn is_pr_branch(candidate: &str, pattern: &str) -> bool {
    extract_source_name(candidate, pattern).is_some()
}

/// A validated naming pattern.
///
/// Unlike the free functions, which accept any string, a `NamingPattern`
/// guarantees the mapping is invertible: at most one placeholder and a
/// non-empty prefix or suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamingPattern(String);

impl NamingPattern {
    /// Parse and validate a pattern.
    ///
    /// # Errors
    ///
    /// - [`PatternError::Ambiguous`] for repeated placeholders
    /// - [`PatternError::Identity`] when the pattern is empty or only the placeholder
    pub fn parse(raw: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        let (prefix, suffix) = split(&raw).ok_or_else(|| PatternError::Ambiguous(raw.clone()))?;
        if prefix.is_empty() && suffix.is_empty() {
            return Err(PatternError::Identity(raw));
        }
        Ok(Self(raw))
    }

    /// The raw pattern string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// See [`make_pr_name`].
    pub fn pr_name(&self, source: &str) -> String {
        make_pr_name(source, &self.0)
    }

    /// See [`extract_source_name`].
    pub fn source_name(&self, candidate: &str) -> Option<String> {
        extract_source_name(candidate, &self.0)
    }

    /// See [`is_pr_branch`].
    pub fn matches(&self, candidate: &str) -> bool {
        is_pr_branch(candidate, &self.0)
    }
}

impl Default for NamingPattern {
    fn default() -> Self {
        Self(DEFAULT_PATTERN.to_string())
    }
}

impl TryFrom<String> for NamingPattern {
    type Error = PatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<NamingPattern> for String {
    fn from(pattern: NamingPattern) -> Self {
        pattern.0
    }
}

impl std::fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
