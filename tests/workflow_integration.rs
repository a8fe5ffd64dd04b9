//! End-to-end workflow tests against real repositories.
//!
//! History is rewritten with the `git filter-branch` backend, which ships
//! with git, so these tests need nothing beyond a git installation.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use twinbranch::core::config::Config;
use twinbranch::core::managed::DirLister;
use twinbranch::engine::{
    self, InitOptions, PushOptions, Session, SynthesisOptions, WorkflowError,
};
use twinbranch::git::Git;
use twinbranch::rewrite::{FilterBranch, FilterRepo, HistoryRewriter};

// =============================================================================
// Fixture
// =============================================================================

/// main: README.md + AGENTS.md ("base agents").
/// feature: init (TASKS.md, .agent.toml, descriptor), AGENTS.md edited,
/// then a code commit.
struct Fixture {
    dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = &dir.path().to_path_buf();

        git(path, &["init", "-b", "main"]);
        git(path, &["config", "user.email", "test@example.com"]);
        git(path, &["config", "user.name", "Test User"]);
        write(path, "README.md", "# Project\n");
        write(path, "AGENTS.md", "base agents\n");
        git(path, &["add", "."]);
        git(path, &["commit", "-m", "Initial commit"]);
        git(path, &["checkout", "-b", "feature"]);

        let fixture = Self {
            dir,
            config: Config::default(),
        };

        {
            let repo = fixture.repo();
            let rewriter = FilterBranch;
            let session = Session::new(&repo, &rewriter, &fixture.config);
            engine::init(
                &session,
                &DirLister,
                InitOptions {
                    commit: true,
                    ..Default::default()
                },
            )
            .expect("init failed");
        }

        write(path, "AGENTS.md", "feature agents\n");
        git(path, &["commit", "-am", "Tune agent instructions"]);
        write(path, "src.txt", "code\n");
        git(path, &["add", "src.txt"]);
        git(path, &["commit", "-m", "Add code"]);

        fixture
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn repo(&self) -> Git {
        Git::open(self.path()).expect("failed to open repo")
    }

    fn run<T>(&self, f: impl FnOnce(&Session<'_>) -> T) -> T {
        self.run_with(&FilterBranch, f)
    }

    fn run_with<T>(
        &self,
        rewriter: &dyn HistoryRewriter,
        f: impl FnOnce(&Session<'_>) -> T,
    ) -> T {
        let repo = self.repo();
        let session = Session::new(&repo, rewriter, &self.config);
        f(&session)
    }

    fn git(&self, args: &[&str]) -> String {
        git(self.path(), args)
    }

    fn exists_at(&self, rev: &str, path: &str) -> bool {
        Command::new("git")
            .args(["cat-file", "-e", &format!("{rev}:{path}")])
            .current_dir(self.path())
            .output()
            .expect("git cat-file failed")
            .status
            .success()
    }

    fn current(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }
}

fn git(dir: &Path, args: &[&str]) -> String {
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

fn write(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
}

// =============================================================================
// Synthesis
// =============================================================================

#[test]
fn pr_branch_has_base_state_of_managed_files() {
    let fx = Fixture::new();
    let report = fx
        .run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();

    assert_eq!(report.pr.as_str(), "feature--PR");
    assert_eq!(report.base.as_str(), "main");
    assert_eq!(report.rewritten_commits, 3);

    // Present on base but modified on source: restored
    assert_eq!(fx.git(&["show", "feature--PR:AGENTS.md"]), "base agents");
    // Never on base: absent
    assert!(!fx.exists_at("feature--PR", "TASKS.md"));
    assert!(!fx.exists_at("feature--PR", ".agent.toml"));
    assert!(!fx.exists_at("feature--PR", ".twinbranch.json"));
    // Ordinary changes survive
    assert_eq!(fx.git(&["show", "feature--PR:src.txt"]), "code");

    // Source untouched and still checked out
    assert_eq!(fx.git(&["show", "feature:AGENTS.md"]), "feature agents");
    assert_eq!(fx.current(), "feature");
}

#[test]
fn filter_repo_backend_restores_managed_files() {
    let fx = Fixture::new();
    if FilterRepo.ensure_available(fx.path()).is_err() {
        eprintln!("git-filter-repo not installed, skipping");
        return;
    }
    let main_tip = fx.git(&["rev-parse", "main"]);

    let report = fx
        .run_with(&FilterRepo, |s| {
            engine::synthesize(s, SynthesisOptions::default())
        })
        .unwrap();
    assert_eq!(report.rewritten_commits, 3);

    assert_eq!(fx.git(&["show", "feature--PR:AGENTS.md"]), "base agents");
    assert!(!fx.exists_at("feature--PR", "TASKS.md"));
    assert!(!fx.exists_at("feature--PR", ".twinbranch.json"));
    assert_eq!(fx.git(&["show", "feature--PR:src.txt"]), "code");
    assert_eq!(fx.git(&["show", "feature:AGENTS.md"]), "feature agents");

    assert_eq!(fx.git(&["merge-base", "feature--PR", "main"]), main_tip);
    assert_eq!(fx.git(&["merge-base", "feature--PR", "feature"]), main_tip);
    assert_eq!(fx.current(), "feature");
}

#[test]
fn commits_before_merge_base_keep_their_hashes() {
    let fx = Fixture::new();
    let main_tip = fx.git(&["rev-parse", "main"]);
    fx.run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();

    assert_eq!(fx.git(&["merge-base", "feature--PR", "main"]), main_tip);
    assert_eq!(fx.git(&["merge-base", "feature--PR", "feature"]), main_tip);
    assert_eq!(
        fx.git(&["rev-list", "--count", "main..feature--PR"]),
        "3"
    );
}

#[test]
fn synthesis_is_repeatable() {
    let fx = Fixture::new();
    fx.run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();
    let first = fx.git(&["rev-parse", "feature--PR^{tree}"]);

    let second = fx
        .run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();
    assert!(second.replaced_existing);
    assert_eq!(fx.git(&["rev-parse", "feature--PR^{tree}"]), first);
    assert!(fx.git(&["for-each-ref", "refs/original/"]).is_empty());
}

#[test]
fn base_binding_is_persisted() {
    let fx = Fixture::new();
    fx.run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();
    assert_eq!(
        fx.git(&["config", "--local", "branch.feature.twinbranchBase"]),
        "main"
    );
}

// =============================================================================
// Workflows
// =============================================================================

#[test]
fn pr_then_switch_round_trip() {
    let fx = Fixture::new();
    fx.run(|s| engine::pr(s, SynthesisOptions::default()))
        .unwrap();
    assert_eq!(fx.current(), "feature--PR");

    fx.run(engine::switch).unwrap();
    assert_eq!(fx.current(), "feature");
    fx.run(engine::switch).unwrap();
    assert_eq!(fx.current(), "feature--PR");
}

#[test]
fn pr_from_pr_branch_needs_force() {
    let fx = Fixture::new();
    fx.run(|s| engine::pr(s, SynthesisOptions::default()))
        .unwrap();

    let err = fx
        .run(|s| engine::pr(s, SynthesisOptions::default()))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::OnPrBranch { .. }));

    let report = fx
        .run(|s| {
            engine::pr(
                s,
                SynthesisOptions {
                    base: Some("main"),
                    allow_pr_source: true,
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert_eq!(report.pr.as_str(), "feature--PR--PR");
}

#[test]
fn push_round_trip_and_forced_retry() {
    let fx = Fixture::new();
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--bare"]);
    fx.git(&["remote", "add", "origin", remote.path().to_str().unwrap()]);

    let report = fx
        .run(|s| engine::push(s, PushOptions::default()))
        .unwrap();
    assert!(!report.forced);
    assert_eq!(fx.current(), "feature");
    assert_eq!(
        git(remote.path(), &["rev-parse", "feature--PR"]),
        fx.git(&["rev-parse", "feature--PR"])
    );

    // Rewriting the source tip makes the new PR branch diverge from the remote
    fx.git(&["commit", "--amend", "-m", "Add code (reworded)"]);

    let err = fx
        .run(|s| engine::push(s, PushOptions::default()))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PushRejected { .. }));
    assert_eq!(fx.current(), "feature");

    let report = fx
        .run(|s| {
            engine::push(
                s,
                PushOptions {
                    force: true,
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert!(report.forced);
    assert_eq!(fx.current(), "feature");
}

#[test]
fn push_to_unreachable_remote_restores_source() {
    let fx = Fixture::new();
    fx.git(&["remote", "add", "origin", "/nonexistent/twinbranch-remote"]);

    let err = fx
        .run(|s| engine::push(s, PushOptions::default()))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PushFailed { .. }));
    assert_eq!(fx.current(), "feature");
}

#[test]
fn merge_brings_clean_history_into_base() {
    let fx = Fixture::new();
    fx.run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();

    let report = fx.run(|s| engine::merge(s, true)).unwrap();
    assert_eq!(report.base.as_str(), "main");
    assert_eq!(fx.current(), "feature");

    assert!(fx.exists_at("main", "src.txt"));
    assert!(!fx.exists_at("main", "TASKS.md"));
    assert_eq!(fx.git(&["show", "main:AGENTS.md"]), "base agents");
}

#[test]
fn conflicting_merge_is_aborted() {
    let fx = Fixture::new();
    fx.run(|s| engine::synthesize(s, SynthesisOptions::default()))
        .unwrap();

    fx.git(&["checkout", "main"]);
    write(fx.path(), "src.txt", "conflicting\n");
    fx.git(&["add", "src.txt"]);
    fx.git(&["commit", "-m", "Conflict"]);
    fx.git(&["checkout", "feature"]);

    let err = fx.run(|s| engine::merge(s, false)).unwrap_err();
    assert!(matches!(err, WorkflowError::MergeFailed { .. }));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(fx.current(), "feature");
    assert_eq!(fx.git(&["status", "--porcelain"]), "");
}
