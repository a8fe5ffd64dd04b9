//! rewrite::mock
//!
//! Recording rewriter for engine tests.
//!
//! `RecordingRewriter` performs no rewriting. It records every request and
//! cleanup call, and can be configured to report the tool as missing or to
//! fail the rewrite.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{CleanupOutcome, HistoryRewriter, RewriteError, RewriteRequest};

/// A recorded rewrite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRewrite {
    /// Rewritten branch
    pub branch: String,
    /// Merge-base the range started from
    pub merge_base: String,
    /// Paths reverted
    pub paths: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    available: bool,
    failure: Option<String>,
    rewrites: Vec<RecordedRewrite>,
    cleanups: usize,
    availability_checks: usize,
}

/// Rewriter double. Clones share state.
#[derive(Debug, Clone)]
pub struct RecordingRewriter {
    inner: Arc<Mutex<Inner>>,
}

impl Default for RecordingRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRewriter {
    /// An available rewriter that always succeeds.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                available: true,
                ..Default::default()
            })),
        }
    }

    /// A rewriter whose tool is not installed.
    pub fn unavailable() -> Self {
        let rewriter = Self::new();
        rewriter.lock().available = false;
        rewriter
    }

    /// A rewriter whose tool exits non-zero with `stderr`.
    pub fn failing(stderr: &str) -> Self {
        let rewriter = Self::new();
        rewriter.lock().failure = Some(stderr.to_string());
        rewriter
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Requests received, in order.
    pub fn rewrites(&self) -> Vec<RecordedRewrite> {
        self.lock().rewrites.clone()
    }

    /// Number of `clear_state` calls.
    pub fn cleanups(&self) -> usize {
        self.lock().cleanups
    }

    /// Number of `ensure_available` calls.
    pub fn availability_checks(&self) -> usize {
        self.lock().availability_checks
    }
}

impl HistoryRewriter for RecordingRewriter {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn ensure_available(&self, _work_dir: &Path) -> Result<(), RewriteError> {
        let mut inner = self.lock();
        inner.availability_checks += 1;
        if inner.available {
            Ok(())
        } else {
            Err(RewriteError::Unavailable {
                tool: "recording",
                hint: "disabled for this test".to_string(),
            })
        }
    }

    fn clear_state(&self, _work_dir: &Path, _git_dir: &Path) -> CleanupOutcome {
        self.lock().cleanups += 1;
        CleanupOutcome::Absent
    }

    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<(), RewriteError> {
        let mut inner = self.lock();
        inner.rewrites.push(RecordedRewrite {
            branch: request.branch.to_string(),
            merge_base: request.merge_base.to_string(),
            paths: request.paths.to_vec(),
        });
        match &inner.failure {
            Some(stderr) => Err(RewriteError::ToolFailed {
                tool: "recording",
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }
}
