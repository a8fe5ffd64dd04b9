//! git::mock
//!
//! In-memory version control for deterministic testing.
//!
//! # Design
//!
//! `MockRepo` implements [`VersionControl`] over a small model: every branch
//! is a linear list of synthetic commit ids plus a flat map of committed
//! files. Branches created with [`MockRepo::add_branch`] share one root
//! commit, so they always have a merge-base; [`MockRepo::add_orphan`] gives
//! unrelated history. Every trait call is recorded as a [`MockOperation`],
//! and individual operations can be made to fail with [`FailOn`].
//!
//! # Example
//!
//! ```
//! use twinbranch::git::mock::MockRepo;
//! use twinbranch::git::VersionControl;
//! use twinbranch::core::types::BranchName;
//!
//! let repo = MockRepo::new("/tmp/work");
//! repo.add_branch("main");
//! repo.branch_from("feature", "main");
//! repo.commit("feature");
//! repo.set_current("feature");
//!
//! let main = BranchName::new("main").unwrap();
//! let feature = BranchName::new("feature").unwrap();
//! let base = repo.merge_base(&feature, &main).unwrap().unwrap();
//! let tip = repo.branch_tip(&feature).unwrap();
//! assert_eq!(repo.commit_count(&base, &tip).unwrap(), 1);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{PushOutcome, VersionControl};
use super::GitError;
use crate::core::types::{BranchName, Oid};

/// Mock repository for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockRepo {
    work_dir: PathBuf,
    git_dir: PathBuf,
    inner: Arc<Mutex<MockRepoInner>>,
}

#[derive(Debug, Clone, Default)]
struct MockBranch {
    history: Vec<String>,
    files: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MockRepoInner {
    branches: BTreeMap<String, MockBranch>,
    current: Option<String>,
    config: BTreeMap<String, String>,
    remote_heads: BTreeMap<String, String>,
    push_outcomes: VecDeque<PushOutcome>,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
    root: String,
    next_commit: u64,
}

impl MockRepoInner {
    fn new_commit(&mut self) -> String {
        self.next_commit += 1;
        format!("{:040x}", self.next_commit)
    }

    fn branch(&self, name: &str) -> Result<&MockBranch, GitError> {
        self.branches.get(name).ok_or_else(|| GitError::RefNotFound {
            refname: format!("refs/heads/{name}"),
        })
    }

    fn should_fail(&self, op: &MockOperation) -> bool {
        self.fail_on.iter().any(|f| f.matches(op))
    }
}

/// Which operation should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Fail checkout of the named branch.
    Checkout(String),
    /// Fail every branch creation.
    CreateBranch,
    /// Fail every push with a non-rejection error.
    Push,
    /// Fail every merge.
    Merge,
    /// Fail every commit.
    Commit,
}

impl FailOn {
    fn matches(&self, op: &MockOperation) -> bool {
        match (self, op) {
            (FailOn::Checkout(want), MockOperation::Checkout { branch }) => want == branch,
            (FailOn::CreateBranch, MockOperation::CreateBranch { .. }) => true,
            (FailOn::Push, MockOperation::Push { .. }) => true,
            (FailOn::Merge, MockOperation::Merge { .. }) => true,
            (FailOn::Commit, MockOperation::Commit { .. }) => true,
            _ => false,
        }
    }
}

/// Recorded mutation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateBranch { name: String, start: String },
    DeleteBranch { name: String },
    Checkout { branch: String },
    ConfigSet { key: String, value: String },
    Push { remote: String, branch: String, force: bool },
    Merge { branch: String, no_ff: bool },
    MergeAbort,
    Commit { paths: Vec<String>, message: String },
}

impl MockRepo {
    /// Create an empty repository rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(".git");
        let mut inner = MockRepoInner {
            branches: BTreeMap::new(),
            current: None,
            config: BTreeMap::new(),
            remote_heads: BTreeMap::new(),
            push_outcomes: VecDeque::new(),
            fail_on: Vec::new(),
            operations: Vec::new(),
            root: String::new(),
            next_commit: 0,
        };
        inner.root = inner.new_commit();
        Self {
            work_dir,
            git_dir,
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockRepoInner> {
        // A poisoned lock only happens after a test already panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Fixture builders
    // =========================================================================

    /// Add a branch at the shared root commit.
    pub fn add_branch(&self, name: &str) {
        let mut inner = self.lock();
        let root = inner.root.clone();
        inner.branches.insert(
            name.to_string(),
            MockBranch {
                history: vec![root],
                files: BTreeMap::new(),
            },
        );
        if inner.current.is_none() {
            inner.current = Some(name.to_string());
        }
    }

    /// Add a branch with history unrelated to every other branch.
    pub fn add_orphan(&self, name: &str) {
        let mut inner = self.lock();
        let commit = inner.new_commit();
        inner.branches.insert(
            name.to_string(),
            MockBranch {
                history: vec![commit],
                files: BTreeMap::new(),
            },
        );
    }

    /// Add `name` as a copy of `parent`.
    pub fn branch_from(&self, name: &str, parent: &str) {
        let mut inner = self.lock();
        let copy = inner.branches.get(parent).cloned().unwrap_or_default();
        inner.branches.insert(name.to_string(), copy);
    }

    /// Append a commit to `branch`, returning its id.
    pub fn commit(&self, branch: &str) -> String {
        let mut inner = self.lock();
        let commit = inner.new_commit();
        if let Some(b) = inner.branches.get_mut(branch) {
            b.history.push(commit.clone());
        }
        commit
    }

    /// Set a committed file on `branch`.
    pub fn set_file(&self, branch: &str, path: &str, content: &str) {
        let mut inner = self.lock();
        if let Some(b) = inner.branches.get_mut(branch) {
            b.files.insert(path.to_string(), content.to_string());
        }
    }

    /// Make `branch` the checked-out branch without recording an operation.
    pub fn set_current(&self, branch: &str) {
        self.lock().current = Some(branch.to_string());
    }

    /// Point `refs/remotes/<remote>/HEAD` at `branch`.
    pub fn set_remote_head(&self, remote: &str, branch: &str) {
        self.lock()
            .remote_heads
            .insert(remote.to_string(), branch.to_string());
    }

    /// Queue outcomes for successive pushes; an empty queue means `Pushed`.
    pub fn queue_push_outcome(&self, outcome: PushOutcome) {
        self.lock().push_outcomes.push_back(outcome);
    }

    /// Make an operation fail.
    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on.push(fail);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All recorded mutations, in order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Name of the checked-out branch.
    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Whether a branch exists, by raw name.
    pub fn has_branch(&self, name: &str) -> bool {
        self.lock().branches.contains_key(name)
    }

    /// Raw config value.
    pub fn config_value(&self, key: &str) -> Option<String> {
        self.lock().config.get(key).cloned()
    }

    fn record(&self, op: MockOperation) -> Result<(), GitError> {
        let mut inner = self.lock();
        let fail = inner.should_fail(&op);
        let command = format!("{op:?}");
        inner.operations.push(op);
        if fail {
            return Err(GitError::CommandFailed {
                command,
                stderr: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

impl VersionControl for MockRepo {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        match self.lock().current.as_deref() {
            Some(name) => Ok(Some(BranchName::new(name)?)),
            None => Ok(None),
        }
    }

    fn branch_exists(&self, branch: &BranchName) -> Result<bool, GitError> {
        Ok(self.has_branch(branch.as_str()))
    }

    fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let inner = self.lock();
        let mut names = Vec::new();
        for name in inner.branches.keys() {
            names.push(BranchName::new(name.as_str())?);
        }
        Ok(names)
    }

    fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GitError> {
        let inner = self.lock();
        let b = inner.branch(branch.as_str())?;
        let tip = b.history.last().cloned().unwrap_or_default();
        Ok(Oid::new(tip)?)
    }

    fn merge_base(&self, a: &BranchName, b: &BranchName) -> Result<Option<Oid>, GitError> {
        let inner = self.lock();
        let a = &inner.branch(a.as_str())?.history;
        let b = &inner.branch(b.as_str())?.history;
        let common = a
            .iter()
            .zip(b.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| x.clone());
        match common {
            Some(oid) => Ok(Some(Oid::new(oid)?)),
            None => Ok(None),
        }
    }

    fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError> {
        let inner = self.lock();
        for branch in inner.branches.values() {
            if let Some(tip_pos) = branch.history.iter().position(|c| c == tip.as_str()) {
                let walked = &branch.history[..=tip_pos];
                return Ok(match walked.iter().position(|c| c == base.as_str()) {
                    Some(base_pos) => tip_pos - base_pos,
                    None => walked.len(),
                });
            }
        }
        Err(GitError::ObjectNotFound {
            oid: tip.to_string(),
        })
    }

    fn read_file_at(&self, branch: &BranchName, path: &str) -> Result<Option<String>, GitError> {
        let inner = self.lock();
        Ok(inner.branch(branch.as_str())?.files.get(path).cloned())
    }

    fn create_branch(&self, name: &BranchName, start: &BranchName) -> Result<(), GitError> {
        self.record(MockOperation::CreateBranch {
            name: name.to_string(),
            start: start.to_string(),
        })?;
        let mut inner = self.lock();
        if inner.branches.contains_key(name.as_str()) {
            return Err(GitError::CommandFailed {
                command: format!("git branch {name} {start}"),
                stderr: format!("fatal: a branch named '{name}' already exists"),
            });
        }
        let copy = inner.branch(start.as_str())?.clone();
        inner.branches.insert(name.to_string(), copy);
        Ok(())
    }

    fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        self.record(MockOperation::DeleteBranch {
            name: name.to_string(),
        })?;
        let mut inner = self.lock();
        if inner.current.as_deref() == Some(name.as_str()) {
            return Err(GitError::CommandFailed {
                command: format!("git branch -D {name}"),
                stderr: format!("error: cannot delete branch '{name}' used by worktree"),
            });
        }
        inner.branches.remove(name.as_str());
        Ok(())
    }

    fn checkout(&self, name: &BranchName) -> Result<(), GitError> {
        self.record(MockOperation::Checkout {
            branch: name.to_string(),
        })?;
        let mut inner = self.lock();
        inner.branch(name.as_str())?;
        inner.current = Some(name.to_string());
        Ok(())
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        Ok(self.config_value(key))
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.record(MockOperation::ConfigSet {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        self.lock().config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remote_default_branch(&self, remote: &str) -> Result<Option<String>, GitError> {
        Ok(self.lock().remote_heads.get(remote).cloned())
    }

    fn push(
        &self,
        remote: &str,
        branch: &BranchName,
        force: bool,
    ) -> Result<PushOutcome, GitError> {
        self.record(MockOperation::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
            force,
        })?;
        Ok(self
            .lock()
            .push_outcomes
            .pop_front()
            .unwrap_or(PushOutcome::Pushed))
    }

    fn merge(&self, branch: &BranchName, no_ff: bool) -> Result<(), GitError> {
        self.record(MockOperation::Merge {
            branch: branch.to_string(),
            no_ff,
        })?;
        let mut inner = self.lock();
        let incoming = inner.branch(branch.as_str())?.clone();
        let current = inner.current.clone().unwrap_or_default();
        if let Some(target) = inner.branches.get_mut(&current) {
            target.history = incoming.history;
            target.files = incoming.files;
        }
        Ok(())
    }

    fn merge_abort(&self) -> Result<(), GitError> {
        self.record(MockOperation::MergeAbort)
    }

    fn stage_and_commit(&self, paths: &[String], message: &str) -> Result<(), GitError> {
        self.record(MockOperation::Commit {
            paths: paths.to_vec(),
            message: message.to_string(),
        })?;
        let current = self.current().unwrap_or_default();
        self.commit(&current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    #[test]
    fn first_branch_becomes_current() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        repo.add_branch("other");
        assert_eq!(repo.current_branch().unwrap(), Some(name("main")));
        assert_eq!(repo.list_branches().unwrap(), vec![name("main"), name("other")]);
    }

    #[test]
    fn orphan_has_no_merge_base() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        repo.add_orphan("gh-pages");
        assert_eq!(repo.merge_base(&name("main"), &name("gh-pages")).unwrap(), None);
    }

    #[test]
    fn commit_count_from_merge_base() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        repo.commit("main");
        repo.branch_from("feature", "main");
        repo.commit("feature");
        repo.commit("feature");
        repo.commit("main");

        let mb = repo.merge_base(&name("feature"), &name("main")).unwrap().unwrap();
        let tip = repo.branch_tip(&name("feature")).unwrap();
        assert_eq!(repo.commit_count(&mb, &tip).unwrap(), 2);
        assert_eq!(repo.commit_count(&tip, &tip).unwrap(), 0);
    }

    #[test]
    fn cannot_delete_checked_out_branch() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        assert!(repo.delete_branch(&name("main")).is_err());
        assert!(repo.has_branch("main"));
    }

    #[test]
    fn scripted_push_outcomes() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        repo.queue_push_outcome(PushOutcome::Rejected {
            stderr: "non-fast-forward".into(),
        });
        let first = repo.push("origin", &name("main"), false).unwrap();
        let second = repo.push("origin", &name("main"), true).unwrap();
        assert!(matches!(first, PushOutcome::Rejected { .. }));
        assert_eq!(second, PushOutcome::Pushed);
    }

    #[test]
    fn fail_on_records_then_fails() {
        let repo = MockRepo::new("/work");
        repo.add_branch("main");
        repo.add_branch("dev");
        repo.fail_on(FailOn::Checkout("dev".into()));

        assert!(repo.checkout(&name("dev")).is_err());
        assert_eq!(repo.current().as_deref(), Some("main"));
        assert_eq!(
            repo.operations(),
            vec![MockOperation::Checkout {
                branch: "dev".into()
            }]
        );
    }
}
