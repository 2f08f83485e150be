//! Shared fixture for integration tests.
//!
//! A bare origin repository plus a work clone used to seed it. Engine
//! operations run against the origin, the way a server would host it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use gitweave::core::identity::{Identity, Signature};
use gitweave::core::types::Oid;
use gitweave::engine::Engine;

/// A bare origin with a `main` branch and a work clone.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create an origin whose `main` holds one commit with `README.md`.
    pub fn new() -> Self {
        let repo = Self::empty();
        run_git(repo.dir.path(), &["clone", "--quiet", "origin.git", "work"]);
        run_git(&repo.work(), &["config", "user.email", "test@example.com"]);
        run_git(&repo.work(), &["config", "user.name", "Test User"]);
        run_git(&repo.work(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    /// Create an origin with no commits.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(
            dir.path(),
            &["init", "--quiet", "--bare", "--initial-branch=main", "origin.git"],
        );
        Self { dir }
    }

    /// The bare repository engine operations target.
    pub fn origin(&self) -> PathBuf {
        self.dir.path().join("origin.git")
    }

    /// The seeding work clone.
    pub fn work(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Write a file in the work clone, commit and push the current branch.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        let full = self.work().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
        run_git(&self.work(), &["add", path]);
        run_git(&self.work(), &["commit", "--quiet", "-m", message]);
        run_git(&self.work(), &["push", "--quiet", "origin", "HEAD"]);
        self.work_head()
    }

    /// Create and check out a branch in the work clone.
    pub fn checkout_new(&self, branch: &str) {
        run_git(&self.work(), &["checkout", "--quiet", "-b", branch]);
    }

    pub fn checkout(&self, branch: &str) {
        run_git(&self.work(), &["checkout", "--quiet", branch]);
    }

    fn work_head(&self) -> Oid {
        Oid::new(git_stdout(&self.work(), &["rev-parse", "HEAD"])).unwrap()
    }

    /// Resolve a revision in the origin.
    pub fn rev(&self, rev: &str) -> Oid {
        Oid::new(git_stdout(&self.origin(), &["rev-parse", rev])).unwrap()
    }

    /// Whether `rev` resolves in the origin.
    pub fn has_rev(&self, rev: &str) -> bool {
        Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", rev])
            .current_dir(self.origin())
            .output()
            .expect("git rev-parse failed")
            .status
            .success()
    }

    /// Content of `path` at `rev` in the origin.
    pub fn show(&self, rev: &str, path: &str) -> String {
        git_stdout(&self.origin(), &["show", &format!("{rev}:{path}")])
    }

    /// Parent commits of `rev` in the origin.
    pub fn parents(&self, rev: &str) -> Vec<String> {
        git_stdout(&self.origin(), &["rev-list", "--parents", "-n", "1", rev])
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect()
    }
}

pub fn engine() -> Engine {
    Engine::default()
}

pub fn signature() -> Signature {
    Signature::now(Identity::new("Test User", "test@example.com"))
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
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
}

/// Run a git command and return its trimmed stdout.
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
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
