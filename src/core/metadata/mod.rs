//! core::metadata
//!
//! Branch descriptor schema and storage.
//!
//! # Modules
//!
//! - [`schema`] - Descriptor schema types (v1)
//! - [`store`] - Working-tree and committed-snapshot access
//!
//! # Architecture
//!
//! Each source branch carries its descriptor as a tracked JSON file at the
//! repository root. Because the file is committed, the descriptor survives
//! branch renames and is visible from any other branch through a blob read.
//!
//! Metadata is advisory: every command must still work on a branch that has
//! no descriptor, falling back to the naming pattern and base detection.

pub mod schema;
pub mod store;

pub use schema::{
    parse_descriptor, Descriptor, MetadataError, DEFAULT_TEMPLATE, METADATA_FILE, SCHEMA_VERSION,
};
pub use store::{read_worktree, write_descriptor, MetadataStore, StoreError};
