//! sharedrepo
//!
//! Scratch repositories for transactional writes.
//!
//! # Architecture
//!
//! A [`SharedRepo`] is a private repository under the scratch directory that
//! borrows the origin's object store through alternates. Mutations happen
//! there with plumbing only, and the result reaches the origin through one
//! leased push:
//!
//! ```text
//! Created -> Clone(branch) | Init -> index/tree/commit plumbing -> push -> dropped
//! ```
//!
//! # Invariants
//!
//! - The origin changes only through [`SharedRepo::push`], and every push
//!   carries a lease on the destination's expected value
//! - Configuration changes stay in the scratch repository's local config
//! - The scratch directory is removed when the value is dropped, on every
//!   exit path
//!
//! # Example
//!
//! ```ignore
//! let scratch = SharedRepo::new(&config, &origin)?;
//! scratch.clone_branch(&ctx, &branch)?;
//! let blob = scratch.write_object(&ctx, b"hello\n")?;
//! scratch.add_to_index(&ctx, FileMode::Regular, &blob, "hello.txt")?;
//! let tree = scratch.write_tree(&ctx)?;
//! let commit = scratch.commit_tree(&ctx, &tree, Some(&parent), "add hello", &author, &committer)?;
//! scratch.push(&ctx, commit.as_str(), &RefName::for_branch(&branch), Some(&parent))?;
//! ```

pub mod files;
pub mod merge;

pub use files::{apply_actions, FileAction, FileActionKind};
pub use merge::{MergeOutcome, MergeRequest};

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::identity::Signature;
use crate::core::types::{BranchName, Oid, RefName, TagName};
use crate::git::{CommandError, CommandOutput, Git, GitCommand};

/// Index modes a file commit can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Regular,
    Executable,
}

impl FileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
        }
    }
}

/// Stderr fragments git prints when a leased push is refused.
const PUSH_REJECTED_MARKERS: [&str; 3] = ["[rejected]", "stale info", "[remote rejected]"];

/// A private scratch repository linked to an origin repository.
#[derive(Debug)]
pub struct SharedRepo {
    dir: TempDir,
    origin: PathBuf,
    origin_objects: PathBuf,
    git_binary: String,
}

impl SharedRepo {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Allocate an empty scratch directory for `origin`.
    pub fn new(config: &Config, origin: &Git) -> Result<Self> {
        let root = config.scratch_dir();
        std::fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new()
            .prefix("gitweave-")
            .tempdir_in(&root)?;
        debug!(scratch = %dir.path().display(), origin = %origin.git_dir().display(), "allocated scratch repository");
        Ok(Self {
            dir,
            origin: origin.git_dir().to_path_buf(),
            origin_objects: origin.objects_dir(),
            git_binary: config.git_binary().to_string(),
        })
    }

    /// Working directory of the scratch repository.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the origin repository pushes go to.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    fn git_dir(&self) -> PathBuf {
        self.dir.path().join(".git")
    }

    /// Clone `branch` from the origin without copying objects or checking out
    /// files, and load its tree into the index.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the origin has no such branch
    pub fn clone_branch(&self, ctx: &RequestContext, branch: &BranchName) -> Result<()> {
        let result = self
            .command("clone")
            .args(["--shared", "--no-checkout", "--quiet", "-b"])
            .arg(branch.as_str())
            .arg(&self.origin)
            .arg(self.dir.path())
            .run(ctx);
        match result {
            Ok(_) => {}
            Err(e) if e.stderr_contains("Remote branch") && e.stderr_contains("not found") => {
                return Err(Error::not_found("branch", branch.as_str()));
            }
            Err(e) => return Err(Error::plumbing("clone", e)),
        }
        self.run(ctx, "read-tree", self.git("read-tree").arg("HEAD"))?;
        info!(branch = %branch, scratch = %self.path().display(), "cloned into scratch repository");
        Ok(())
    }

    /// Initialize an empty repository that reads the origin's objects.
    pub fn init(&self, ctx: &RequestContext) -> Result<()> {
        self.run(
            ctx,
            "init",
            self.command("init").arg("--quiet").arg(self.dir.path()),
        )?;
        self.link_objects(&[self.origin_objects.as_path()])?;
        debug!(scratch = %self.path().display(), "initialized scratch repository");
        Ok(())
    }

    /// Write the alternates file so `object_dirs` are readable in place.
    pub(crate) fn link_objects(&self, object_dirs: &[&Path]) -> Result<()> {
        let info = self.git_dir().join("objects").join("info");
        std::fs::create_dir_all(&info)?;
        let mut alternates = String::new();
        for dir in object_dirs {
            alternates.push_str(&dir.to_string_lossy());
            alternates.push('\n');
        }
        std::fs::write(info.join("alternates"), alternates)?;
        Ok(())
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn command(&self, subcommand: &str) -> GitCommand {
        GitCommand::new(subcommand).binary(&self.git_binary)
    }

    /// A command run inside the scratch repository.
    pub(crate) fn git(&self, subcommand: &str) -> GitCommand {
        self.command(subcommand).dir(self.dir.path())
    }

    pub(crate) fn run(
        &self,
        ctx: &RequestContext,
        op: &str,
        cmd: GitCommand,
    ) -> Result<CommandOutput> {
        cmd.run(ctx).map_err(|e| Error::plumbing(op, e))
    }

    /// Set a key in the scratch repository's local config.
    pub fn set_config(&self, ctx: &RequestContext, key: &str, value: &str) -> Result<()> {
        self.run(
            ctx,
            "config",
            self.git("config").arg("--local").arg(key).arg(value),
        )?;
        Ok(())
    }

    /// Index paths matching `paths` (all paths when empty).
    pub fn ls_files(&self, ctx: &RequestContext, paths: &[&str]) -> Result<Vec<String>> {
        let out = self.run(
            ctx,
            "ls-files",
            self.git("ls-files").arg("-z").arg("--").args(paths),
        )?;
        Ok(out.stdout_nul_separated())
    }

    /// Drop `paths` from the index.
    pub fn remove_from_index(&self, ctx: &RequestContext, paths: &[&str]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut input = Vec::new();
        for path in paths {
            input.extend_from_slice(format!("0 {}\t{path}\0", Oid::zero()).as_bytes());
        }
        self.run(
            ctx,
            "update-index --remove",
            self.git("update-index")
                .args(["--remove", "-z", "--index-info"])
                .stdin(input),
        )?;
        Ok(())
    }

    /// Store `content` as a blob.
    pub fn write_object(&self, ctx: &RequestContext, content: &[u8]) -> Result<Oid> {
        let out = self.run(
            ctx,
            "hash-object",
            self.git("hash-object")
                .args(["-w", "--stdin"])
                .stdin(content.to_vec()),
        )?;
        Ok(Oid::new(out.stdout_trimmed())?)
    }

    /// Add or replace the index entry at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if git rejects the path
    pub fn add_to_index(
        &self,
        ctx: &RequestContext,
        mode: FileMode,
        oid: &Oid,
        path: &str,
    ) -> Result<()> {
        let result = self
            .git("update-index")
            .args(["--add", "--replace", "--cacheinfo"])
            .arg(format!("{},{},{}", mode.as_str(), oid, path))
            .run(ctx);
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.stderr_contains("Invalid path") => {
                Err(Error::invalid(format!("invalid path '{path}'")))
            }
            Err(e) => Err(Error::plumbing("update-index --add", e)),
        }
    }

    /// Write the index as a tree.
    pub fn write_tree(&self, ctx: &RequestContext) -> Result<Oid> {
        let out = self.run(ctx, "write-tree", self.git("write-tree"))?;
        Ok(Oid::new(out.stdout_trimmed())?)
    }

    /// Create a commit for `tree` with an explicit author and committer.
    pub fn commit_tree(
        &self,
        ctx: &RequestContext,
        tree: &Oid,
        parent: Option<&Oid>,
        message: &str,
        author: &Signature,
        committer: &Signature,
    ) -> Result<Oid> {
        let mut cmd = self.git("commit-tree").arg(tree.as_str());
        if let Some(parent) = parent {
            cmd = cmd.arg("-p").arg(parent.as_str());
        }
        let cmd = cmd
            .arg("--no-gpg-sign")
            .envs(author.author_env())
            .envs(committer.committer_env())
            .stdin(format!("{message}\n"));
        let out = self.run(ctx, "commit-tree", cmd)?;
        let commit = Oid::new(out.stdout_trimmed())?;
        debug!(commit = %commit.short(8), tree = %tree.short(8), "created commit");
        Ok(commit)
    }

    /// Create an annotated tag object in the scratch repository.
    pub fn create_annotated_tag(
        &self,
        ctx: &RequestContext,
        name: &TagName,
        target: &Oid,
        message: &str,
        tagger: &Signature,
    ) -> Result<Oid> {
        self.run(
            ctx,
            "tag",
            self.git("tag")
                .arg("-a")
                .arg(name.as_str())
                .arg(target.as_str())
                .arg("-m")
                .arg(message)
                .envs(tagger.committer_env()),
        )?;
        self.rev_parse(ctx, RefName::for_tag(name).as_str())
    }

    /// Resolve `rev` in the scratch repository.
    pub fn rev_parse(&self, ctx: &RequestContext, rev: &str) -> Result<Oid> {
        let out = self.run(
            ctx,
            "rev-parse",
            self.git("rev-parse").arg("--verify").arg(rev),
        )?;
        Ok(Oid::new(out.stdout_trimmed())?)
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Push `src` to `dst` on the origin, only if `dst` still holds
    /// `expected` (`None`: `dst` must not exist).
    ///
    /// # Errors
    ///
    /// - [`Error::PushRejected`] if the lease does not hold
    pub fn push(
        &self,
        ctx: &RequestContext,
        src: &str,
        dst: &RefName,
        expected: Option<&Oid>,
    ) -> Result<()> {
        self.push_refspec(ctx, &format!("{src}:{dst}"), dst, expected)
    }

    /// Delete `dst` on the origin if it still holds `expected`.
    pub fn push_delete(&self, ctx: &RequestContext, dst: &RefName, expected: &Oid) -> Result<()> {
        self.push_refspec(ctx, &format!(":{dst}"), dst, Some(expected))
    }

    fn push_refspec(
        &self,
        ctx: &RequestContext,
        refspec: &str,
        dst: &RefName,
        expected: Option<&Oid>,
    ) -> Result<()> {
        let lease = format!(
            "--force-with-lease={dst}:{}",
            expected.map(Oid::as_str).unwrap_or_default()
        );
        debug!(refspec, lease = %lease, "pushing to origin");
        let result = self
            .git("push")
            .arg("--quiet")
            .arg(&self.origin)
            .arg(refspec)
            .arg(lease)
            .run(ctx);
        match result {
            Ok(_) => {
                info!(refname = %dst, "published");
                Ok(())
            }
            Err(e) if is_push_rejection(&e) => Err(Error::PushRejected {
                refname: dst.to_string(),
                message: e.stderr().unwrap_or_default().to_string(),
            }),
            Err(e) => Err(Error::plumbing(format!("push {dst}"), e)),
        }
    }
}

fn is_push_rejection(err: &CommandError) -> bool {
    PUSH_REJECTED_MARKERS.iter().any(|m| err.stderr_contains(m))
}
