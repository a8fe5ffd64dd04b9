//! engine::guard
//!
//! Restore-on-failure checkout guard.
//!
//! Workflows that move between branches take a [`CheckoutGuard`] on the
//! branch the user started from. Calling [`CheckoutGuard::finish`] returns
//! there and reports errors; if the guard is dropped without `finish` (an
//! early `?` return), the drop performs the same checkout best-effort and
//! logs a warning if it fails, so the original error still propagates.

use tracing::{debug, warn};

use crate::core::types::BranchName;
use crate::git::{GitError, VersionControl};

/// Returns to `original` when the workflow ends, however it ends.
pub struct CheckoutGuard<'a> {
    vcs: &'a dyn VersionControl,
    original: BranchName,
    armed: bool,
}

impl<'a> CheckoutGuard<'a> {
    /// Guard the checkout of `original`.
    pub fn new(vcs: &'a dyn VersionControl, original: BranchName) -> Self {
        Self {
            vcs,
            original,
            armed: true,
        }
    }

    /// Return to the original branch, reporting failure.
    pub fn finish(mut self) -> Result<(), GitError> {
        self.armed = false;
        self.restore()
    }

    fn restore(&self) -> Result<(), GitError> {
        if self.vcs.current_branch()?.as_ref() == Some(&self.original) {
            return Ok(());
        }
        debug!(branch = %self.original, "restoring checkout");
        self.vcs.checkout(&self.original)
    }
}

impl Drop for CheckoutGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.restore() {
            warn!(branch = %self.original, error = %e, "could not restore original branch");
        }
    }
}
