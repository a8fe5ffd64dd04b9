//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. All repository reads and
//! writes flow through the [`VersionControl`] trait. No other module imports
//! `git2` or spawns `git` for repository operations; the rewrite backends
//! are the one exception, since driving the rewrite tool is their purpose.
//!
//! # Modules
//!
//! - [`traits`] - The `VersionControl` trait and `PushOutcome`
//! - [`process`] - Captured subprocess execution
//! - [`mock`] - In-memory implementation for tests
//!
//! # Invariants
//!
//! - All operations return strong types (`Oid`, `BranchName`)
//! - Branch rewrites never require the branch to be checked out

mod interface;
pub mod mock;
pub mod process;
pub mod traits;

pub use interface::{classify_push, Git, GitError};
pub use process::ProcessOutput;
pub use traits::{PushOutcome, VersionControl};
