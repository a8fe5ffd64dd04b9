//! core::metadata::schema
//!
//! Branch descriptor schema (v1).
//!
//! # Format
//!
//! The descriptor is a JSON object committed at the repository root as
//! [`METADATA_FILE`]. Keys are written in a fixed order so diffs between
//! revisions stay readable:
//!
//! ```json
//! {
//!   "version": 1,
//!   "injectedFiles": ["AGENTS.md", "TASKS.md"],
//!   "baseBranch": "main",
//!   "template": "default",
//!   "createdAt": "2026-01-01T00:00:00Z",
//!   "emitBranch": "feature-clean"
//! }
//! ```
//!
//! `baseBranch` and `emitBranch` are optional and omitted when unset.
//!
//! # Strictness
//!
//! Unknown fields are rejected, the version must be exactly
//! [`SCHEMA_VERSION`], and branch names and paths are validated. Callers that
//! only need advisory metadata use [`super::store::MetadataStore::read`],
//! which turns every failure into "no descriptor".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::managed::validate_relative_path;
use crate::core::types::{BranchName, TypeError, UtcTimestamp};

/// File name of the descriptor at the repository root.
pub const METADATA_FILE: &str = ".twinbranch.json";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Template name recorded when files come from the built-in defaults.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Errors from descriptor parsing, validation and storage.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to parse descriptor: {0}")]
    ParseError(String),

    #[error("unsupported descriptor version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("invalid descriptor value: {0}")]
    InvalidValue(String),

    #[error("type validation failed: {0}")]
    TypeError(#[from] TypeError),

    #[error("failed to write descriptor '{path}': {source}")]
    WriteError {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct DescriptorEnvelope {
    version: u32,
}

/// Parse descriptor JSON with version dispatch.
///
/// # Errors
///
/// Returns an error if the JSON is malformed, the version is unsupported,
/// or any field fails validation.
///
/// # Example
///
/// ```
/// use twinbranch::core::metadata::schema::parse_descriptor;
///
/// let json = r#"{
///     "version": 1,
///     "injectedFiles": ["AGENTS.md"],
///     "template": "default",
///     "createdAt": "2026-01-01T00:00:00Z"
/// }"#;
///
/// let descriptor = parse_descriptor(json).unwrap();
/// assert_eq!(descriptor.injected_files, vec!["AGENTS.md"]);
/// assert!(descriptor.emit_branch.is_none());
/// ```
pub fn parse_descriptor(json: &str) -> Result<Descriptor, MetadataError> {
    let envelope: DescriptorEnvelope =
        serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))?;

    match envelope.version {
        1 => {
            let descriptor: Descriptor =
                serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))?;
            descriptor.validate()?;
            Ok(descriptor)
        }
        v => Err(MetadataError::UnsupportedVersion(v)),
    }
}

/// Per-branch descriptor (v1).
///
/// Field order here is the serialized key order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Descriptor {
    /// Schema version (always 1 for this struct)
    pub version: u32,

    /// Files injected into the branch, in injection order
    pub injected_files: Vec<String>,

    /// Branch the source branch is compared and merged against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<BranchName>,

    /// Template the files came from
    pub template: String,

    /// When the branch was initialized
    pub created_at: UtcTimestamp,

    /// Explicit PR branch name, overriding the naming pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_branch: Option<BranchName>,
}

impl Descriptor {
    /// Create a descriptor stamped with the current time.
    pub fn new(template: impl Into<String>, injected_files: Vec<String>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            injected_files,
            base_branch: None,
            template: template.into(),
            created_at: UtcTimestamp::now(),
            emit_branch: None,
        }
    }

    /// Set the base branch.
    pub fn with_base_branch(mut self, base: Option<BranchName>) -> Self {
        self.base_branch = base;
        self
    }

    /// Set the explicit PR branch override.
    pub fn with_emit_branch(mut self, emit: Option<BranchName>) -> Self {
        self.emit_branch = emit;
        self
    }

    /// Validate the descriptor.
    ///
    /// Checks the version, that the template name is non-empty, and that
    /// injected files are unique normalized relative paths.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.version != SCHEMA_VERSION {
            return Err(MetadataError::UnsupportedVersion(self.version));
        }

        if self.template.trim().is_empty() {
            return Err(MetadataError::InvalidValue(
                "template name cannot be empty".to_string(),
            ));
        }

        for (i, path) in self.injected_files.iter().enumerate() {
            validate_relative_path(path).map_err(MetadataError::InvalidValue)?;
            if self.injected_files[..i].contains(path) {
                return Err(MetadataError::InvalidValue(format!(
                    "injected file '{path}' is listed twice"
                )));
            }
        }

        Ok(())
    }

    /// Serialize to the on-disk form: pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, MetadataError> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }
}
