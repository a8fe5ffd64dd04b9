//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! that the Git interface works correctly with actual git operations.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use twinbranch::core::types::BranchName;
use twinbranch::git::{Git, GitError, PushOutcome, VersionControl};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit on main.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn commit_file(&self, path: &str, content: &str, message: &str) {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
    }
}

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn name(s: &str) -> BranchName {
    BranchName::new(s).unwrap()
}

// =============================================================================
// Repository Opening
// =============================================================================

#[test]
fn open_from_subdirectory() {
    let repo = TestRepo::new();
    let subdir = repo.path().join("subdir");
    std::fs::create_dir(&subdir).unwrap();

    let git = Git::open(&subdir).unwrap();
    let expected = repo.path().canonicalize().unwrap();
    assert_eq!(git.work_dir().canonicalize().unwrap(), expected);
    assert!(git.git_dir().ends_with(".git"));
}

#[test]
fn open_non_repository_fails() {
    let dir = TempDir::new().unwrap();
    let git = Git::open(dir.path());
    assert!(matches!(git, Err(GitError::NotARepo { .. })));
}

#[test]
fn open_bare_repository_fails() {
    let dir = TempDir::new().unwrap();
    run_git(dir.path(), &["init", "--bare"]);
    assert!(matches!(Git::open(dir.path()), Err(GitError::BareRepo)));
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn current_branch_and_detached_head() {
    let repo = TestRepo::new();
    let git = repo.git();
    assert_eq!(git.current_branch().unwrap(), Some(name("main")));

    run_git(repo.path(), &["checkout", "--detach"]);
    assert_eq!(git.current_branch().unwrap(), None);
}

#[test]
fn list_branches_is_sorted() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["branch", "zeta"]);
    run_git(repo.path(), &["branch", "alpha"]);

    let names: Vec<String> = repo
        .git()
        .list_branches()
        .unwrap()
        .into_iter()
        .map(|b| b.to_string())
        .collect();
    assert_eq!(names, vec!["alpha", "main", "zeta"]);
}

#[test]
fn merge_base_and_commit_count() {
    let repo = TestRepo::new();
    let base_tip = run_git(repo.path(), &["rev-parse", "main"]);
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    repo.commit_file("a.txt", "a", "a");
    repo.commit_file("b.txt", "b", "b");

    let git = repo.git();
    let mb = git.merge_base(&name("feature"), &name("main")).unwrap().unwrap();
    assert_eq!(mb.as_str(), base_tip);

    let tip = git.branch_tip(&name("feature")).unwrap();
    assert_eq!(git.commit_count(&mb, &tip).unwrap(), 2);
    assert_eq!(git.commit_count(&mb, &mb).unwrap(), 0);
}

#[test]
fn unrelated_histories_have_no_merge_base() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["checkout", "--orphan", "pages"]);
    run_git(repo.path(), &["rm", "-rf", "--cached", "."]);
    repo.commit_file("index.html", "<html>", "pages");

    let git = repo.git();
    assert_eq!(git.merge_base(&name("pages"), &name("main")).unwrap(), None);
}

#[test]
fn read_file_at_branch() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    repo.commit_file("AGENTS.md", "instructions", "agents");
    run_git(repo.path(), &["checkout", "main"]);

    let git = repo.git();
    assert_eq!(
        git.read_file_at(&name("feature"), "AGENTS.md").unwrap().as_deref(),
        Some("instructions")
    );
    assert_eq!(git.read_file_at(&name("main"), "AGENTS.md").unwrap(), None);
    assert!(git.read_file_at(&name("missing"), "AGENTS.md").is_err());
}

#[test]
fn remote_default_branch_from_symbolic_ref() {
    let repo = TestRepo::new();
    let git = repo.git();
    assert_eq!(git.remote_default_branch("origin").unwrap(), None);

    run_git(
        repo.path(),
        &["update-ref", "refs/remotes/origin/develop", "HEAD"],
    );
    run_git(
        repo.path(),
        &[
            "symbolic-ref",
            "refs/remotes/origin/HEAD",
            "refs/remotes/origin/develop",
        ],
    );
    assert_eq!(
        git.remote_default_branch("origin").unwrap().as_deref(),
        Some("develop")
    );
}

// =============================================================================
// Mutations
// =============================================================================

#[test]
fn create_checkout_delete() {
    let repo = TestRepo::new();
    let git = repo.git();

    git.create_branch(&name("topic"), &name("main")).unwrap();
    assert!(git.branch_exists(&name("topic")).unwrap());

    git.checkout(&name("topic")).unwrap();
    assert_eq!(git.current_branch().unwrap(), Some(name("topic")));

    let err = git.delete_branch(&name("topic")).unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }));

    git.checkout(&name("main")).unwrap();
    git.delete_branch(&name("topic")).unwrap();
    assert!(!git.branch_exists(&name("topic")).unwrap());
}

#[test]
fn config_round_trip_is_repository_local() {
    let repo = TestRepo::new();
    let git = repo.git();
    let key = "branch.main.twinbranchBase";

    assert_eq!(git.config_get(key).unwrap(), None);
    git.config_set(key, "develop").unwrap();
    assert_eq!(git.config_get(key).unwrap().as_deref(), Some("develop"));
    assert_eq!(run_git(repo.path(), &["config", "--local", key]), "develop");
}

#[test]
fn stage_and_commit_only_named_paths() {
    let repo = TestRepo::new();
    std::fs::write(repo.path().join("AGENTS.md"), "a").unwrap();
    std::fs::write(repo.path().join("other.txt"), "o").unwrap();

    let git = repo.git();
    git.stage_and_commit(&["AGENTS.md".to_string()], "Add agents")
        .unwrap();

    let files = run_git(repo.path(), &["ls-tree", "--name-only", "HEAD"]);
    assert!(files.contains("AGENTS.md"));
    assert!(!files.contains("other.txt"));
}

#[test]
fn merge_and_abort() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    repo.commit_file("README.md", "feature side\n", "feature");
    run_git(repo.path(), &["checkout", "main"]);
    repo.commit_file("README.md", "main side\n", "main");

    let git = repo.git();
    let err = git.merge(&name("feature"), false).unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }));
    git.merge_abort().unwrap();
    assert_eq!(run_git(repo.path(), &["status", "--porcelain"]), "");
}

#[test]
fn push_to_bare_remote_and_rejection() {
    let repo = TestRepo::new();
    let remote = TempDir::new().unwrap();
    run_git(remote.path(), &["init", "--bare"]);
    run_git(
        repo.path(),
        &["remote", "add", "origin", remote.path().to_str().unwrap()],
    );

    let git = repo.git();
    assert_eq!(
        git.push("origin", &name("main"), false).unwrap(),
        PushOutcome::Pushed
    );

    // Rewrite the local tip so the remote is no longer an ancestor
    run_git(repo.path(), &["commit", "--amend", "-m", "rewritten"]);
    match git.push("origin", &name("main"), false).unwrap() {
        PushOutcome::Rejected { stderr } => assert!(stderr.contains("rejected")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(
        git.push("origin", &name("main"), true).unwrap(),
        PushOutcome::Pushed
    );
}

#[test]
fn push_to_missing_remote_fails() {
    let repo = TestRepo::new();
    let err = repo
        .git()
        .push("nowhere", &name("main"), false)
        .unwrap_err();
    assert!(matches!(err, GitError::CommandFailed { .. }));
}
