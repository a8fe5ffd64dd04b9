//! core
//!
//! Core domain types, schemas, and configuration for twinbranch.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, UtcTimestamp
//! - [`pattern`] - Source/PR branch name mapping
//! - [`managed`] - Managed file set and directory listing
//! - [`metadata`] - Branch descriptor schema and storage
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for twinbranch storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here runs git

pub mod config;
pub mod managed;
pub mod metadata;
pub mod paths;
pub mod pattern;
pub mod types;
