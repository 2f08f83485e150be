//! git::interface
//!
//! Read-side repository access using git2.
//!
//! This is the commit/ref lookup provider and blob reader the engine consults
//! before it mutates anything: default branch, branch and tag existence,
//! tree entries along a path, blob content, merge bases. Lookups go straight
//! to the object database, so they see objects reachable through alternates
//! and are unaffected by loose ref files being rewritten concurrently.
//!
//! Mutations never happen here. They run in a scratch repository through
//! [`GitCommand`](super::GitCommand) and are published by push.
//!
//! # Error Handling
//!
//! git2 errors are mapped into [`GitError`] with the looked-up name or path
//! attached, so callers can tell "not found" apart from real failures.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Errors from repository lookups.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path does not hold a git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object (commit, blob, revision) not found.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID or revision that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or locking error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with the name being looked up.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Whether this error means the looked-up thing does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. }
        )
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::InvalidRefName {
                message: other.to_string(),
            },
        }
    }
}

/// What kind of tree entry sits at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Executable,
    Symlink,
    Dir,
    Submodule,
}

impl EntryKind {
    fn from_filemode(mode: i32) -> Self {
        match mode {
            0o100755 => EntryKind::Executable,
            0o120000 => EntryKind::Symlink,
            0o040000 => EntryKind::Dir,
            0o160000 => EntryKind::Submodule,
            _ => EntryKind::File,
        }
    }
}

/// A tree entry found by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntryInfo {
    /// Object the entry points at
    pub oid: Oid,
    /// Raw git file mode (e.g. `0o100644`)
    pub mode: i32,
    /// Interpreted mode
    pub kind: EntryKind,
}

/// Read-only handle on a (usually bare) repository.
///
/// # Example
///
/// ```ignore
/// use gitweave::git::Git;
/// use std::path::Path;
///
/// let git = Git::open(Path::new("/srv/repos/project.git"))?;
/// if let Some(branch) = git.default_branch()? {
///     let tip = git.resolve_commit(&format!("refs/heads/{branch}"))?;
///     println!("{branch} is at {}", tip.short(7));
/// }
/// ```
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(oid.to_string())?)
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Open the repository at exactly `path`. Bare repositories are expected.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// The git directory (the repository root for bare repositories).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// The object directory other repositories link to through alternates.
    pub fn objects_dir(&self) -> PathBuf {
        self.repo.path().join("objects")
    }

    // =========================================================================
    // Refs
    // =========================================================================

    /// Resolve any revision (ref, short name, SHA) to the commit it names.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the revision does not name a commit
    pub fn resolve_commit(&self, rev: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;
        let commit = object.peel_to_commit().map_err(|e| match e.code() {
            git2::ErrorCode::Peel | git2::ErrorCode::InvalidSpec => GitError::ObjectNotFound {
                oid: rev.to_string(),
            },
            _ => GitError::from_git2(e, rev),
        })?;
        from_git2_oid(commit.id())
    }

    /// Resolve a revision to a commit, returning None if it does not exist.
    pub fn try_resolve_commit(&self, rev: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_commit(rev) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The object a ref points at directly (an annotated tag stays a tag).
    ///
    /// Returns `None` if the ref does not exist. This is the value a leased
    /// push must expect.
    pub fn ref_target(&self, refname: &RefName) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname.as_str()) {
            Ok(reference) => match reference.resolve()?.target() {
                Some(oid) => Ok(Some(from_git2_oid(oid)?)),
                None => Ok(None),
            },
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname.as_str())),
        }
    }

    /// Commit at the tip of a branch, or `None` if the branch does not exist.
    pub fn branch_commit(&self, branch: &BranchName) -> Result<Option<Oid>, GitError> {
        let refname = RefName::for_branch(branch);
        match self.repo.find_reference(refname.as_str()) {
            Ok(reference) => {
                let commit = reference
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
                Ok(Some(from_git2_oid(commit.id())?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname.as_str())),
        }
    }

    /// The branch HEAD points at, even if that branch is unborn.
    pub fn default_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.find_reference("HEAD") {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };
        match head.symbolic_target() {
            Some(target) => match target.strip_prefix(RefName::BRANCH_PREFIX) {
                Some(name) => Ok(Some(BranchName::new(name)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Whether any local branch exists.
    pub fn has_branches(&self) -> Result<bool, GitError> {
        let mut branches = self.repo.branches(Some(git2::BranchType::Local))?;
        Ok(branches.next().transpose()?.is_some())
    }

    // =========================================================================
    // Trees and Blobs
    // =========================================================================

    /// Look up the tree entry at `path` in a commit's tree.
    ///
    /// Returns `None` if nothing exists at that path.
    pub fn tree_entry(&self, commit: &Oid, path: &str) -> Result<Option<TreeEntryInfo>, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(commit)?)
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;
        let tree = commit.tree()?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) => {
                let mode = entry.filemode();
                Ok(Some(TreeEntryInfo {
                    oid: from_git2_oid(entry.id())?,
                    mode,
                    kind: EntryKind::from_filemode(mode),
                }))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, path)),
        }
    }

    /// Read a blob by OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the blob doesn't exist
    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let blob = self
            .repo
            .find_blob(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Commits and Ancestry
    // =========================================================================

    /// Find the merge base of two commits, `None` for unrelated histories.
    pub fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(to_git2_oid(a)?, to_git2_oid(b)?) {
            Ok(oid) => Ok(Some(from_git2_oid(oid)?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Count commits reachable from `tip` but not from `base`.
    pub fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to_git2_oid(tip)?)?;
        revwalk.hide(to_git2_oid(base)?)?;
        Ok(revwalk.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn not_found_classification() {
            let err = GitError::from_git2(
                git2::Error::new(git2::ErrorCode::NotFound, git2::ErrorClass::Reference, "x"),
                "refs/heads/main",
            );
            assert!(matches!(err, GitError::RefNotFound { .. }));
            assert!(err.is_not_found());

            let err = GitError::from_git2(
                git2::Error::new(git2::ErrorCode::NotFound, git2::ErrorClass::Odb, "x"),
                "abc123",
            );
            assert!(matches!(err, GitError::ObjectNotFound { .. }));
        }

        #[test]
        fn locked_is_access_error() {
            let err = GitError::from_git2(
                git2::Error::new(git2::ErrorCode::Locked, git2::ErrorClass::Reference, "busy"),
                "refs/heads/main",
            );
            assert!(matches!(err, GitError::AccessError { .. }));
            assert!(!err.is_not_found());
        }

        #[test]
        fn type_error_conversion() {
            let err: GitError = TypeError::InvalidOid("zz".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
            let err: GitError = TypeError::InvalidBranchName("a..b".into()).into();
            assert!(matches!(err, GitError::InvalidRefName { .. }));
        }
    }

    mod entry_kind {
        use super::*;

        #[test]
        fn from_filemode() {
            assert_eq!(EntryKind::from_filemode(0o100644), EntryKind::File);
            assert_eq!(EntryKind::from_filemode(0o100755), EntryKind::Executable);
            assert_eq!(EntryKind::from_filemode(0o120000), EntryKind::Symlink);
            assert_eq!(EntryKind::from_filemode(0o040000), EntryKind::Dir);
            assert_eq!(EntryKind::from_filemode(0o160000), EntryKind::Submodule);
        }
    }

    mod open {
        use super::*;

        #[test]
        fn rejects_non_repo() {
            let dir = tempfile::TempDir::new().unwrap();
            let err = Git::open(dir.path()).unwrap_err();
            assert!(matches!(err, GitError::NotARepo { .. }));
        }

        #[test]
        fn empty_bare_repo_has_no_branches() {
            let dir = tempfile::TempDir::new().unwrap();
            git2::Repository::init_bare(dir.path()).unwrap();
            let git = Git::open(dir.path()).unwrap();
            assert!(!git.has_branches().unwrap());
            assert!(git.default_branch().unwrap().is_some());
        }
    }
}
