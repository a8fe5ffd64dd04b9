//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! All command output goes through this module so silent, verbose and JSON
//! modes behave the same everywhere.

pub mod output;
