//! core::errors
//!
//! Operation-level error type and its taxonomy.
//!
//! Every engine operation returns [`Error`]. Lower layers keep their own
//! error enums ([`GitError`], [`CommandError`], [`DiffError`], ...) and are
//! folded in with `#[from]`. [`Error::kind`] projects any error onto the
//! [`ErrorKind`] a service layer maps to its status codes.
//!
//! Structured detail (conflicting files, mismatched SHAs, rejected refs) is
//! kept as fields, not only as message text.

use serde::Serialize;
use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::context::ContextError;
use crate::core::types::{Oid, TypeError};
use crate::diff::DiffError;
use crate::git::{CommandError, GitError};
use crate::hash::HashError;
use crate::refs::WalkError;

/// Taxonomy every error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    /// Not mergeable; carries the conflicting files.
    Conflict,
    /// Push rejected, expected SHA moved, unrelated histories.
    PreconditionFailed,
    /// Request cancelled or its deadline passed.
    Aborted,
    Internal,
}

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    #[error("{what} already exists: {name}")]
    AlreadyExists { what: &'static str, name: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A path cannot be created because something is in the way.
    #[error("path conflict at '{path}': {reason}")]
    PathConflict { path: String, reason: String },

    /// Optimistic concurrency check on a file failed.
    #[error("sha does not match for path '{path}' [given: {given}, expected: {expected}]")]
    ShaMismatch {
        path: String,
        given: Oid,
        expected: Oid,
    },

    /// The merge stopped with unresolved conflicts.
    #[error("merge failed with conflicts in {} file(s)", files.len())]
    MergeConflict { files: Vec<String> },

    /// Base and head share no history.
    #[error("merge refused: unrelated histories")]
    UnrelatedHistories,

    /// The remote refused the leased update.
    #[error("push rejected for {refname}: {message}")]
    PushRejected { refname: String, message: String },

    /// A caller-supplied precondition no longer holds.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A wrapped plumbing failure with operation context.
    #[error("{op} failed: {source}")]
    Plumbing {
        op: String,
        #[source]
        source: CommandError,
    },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn already_exists(what: &'static str, name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            what,
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Wrap a plumbing failure with the operation it belonged to.
    pub fn plumbing(op: impl Into<String>, source: CommandError) -> Self {
        match source {
            CommandError::Interrupted { reason, .. } => Error::Context(reason),
            source => Error::Plumbing {
                op: op.into(),
                source,
            },
        }
    }

    /// Map this error onto the taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } | Error::PathConflict { .. } => ErrorKind::AlreadyExists,
            Error::InvalidArgument(_) | Error::Type(_) => ErrorKind::InvalidArgument,
            Error::ShaMismatch { .. } => ErrorKind::InvalidArgument,
            Error::MergeConflict { .. } => ErrorKind::Conflict,
            Error::UnrelatedHistories
            | Error::PushRejected { .. }
            | Error::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Error::Git(e) if e.is_not_found() => ErrorKind::NotFound,
            Error::Git(GitError::InvalidOid { .. } | GitError::InvalidRefName { .. }) => {
                ErrorKind::InvalidArgument
            }
            Error::Diff(e) => e.kind(),
            Error::Walk(WalkError::InvalidPagination(_)) | Error::Hash(_) => {
                ErrorKind::InvalidArgument
            }
            Error::Walk(WalkError::Command(CommandError::Interrupted { .. })) => ErrorKind::Aborted,
            Error::Context(_) => ErrorKind::Aborted,
            Error::Command(CommandError::Interrupted { .. }) => ErrorKind::Aborted,
            Error::Plumbing {
                source: CommandError::Interrupted { .. },
                ..
            } => ErrorKind::Aborted,
            _ => ErrorKind::Internal,
        }
    }

    /// Conflicting file paths, if this is a merge conflict.
    pub fn conflict_files(&self) -> Option<&[String]> {
        match self {
            Error::MergeConflict { files } => Some(files),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::not_found("branch", "x").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::already_exists("tag", "v1").kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            Error::PathConflict {
                path: "a/b".into(),
                reason: "file in the way".into()
            }
            .kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            Error::MergeConflict {
                files: vec!["a.txt".into()]
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(Error::UnrelatedHistories.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            Error::Context(ContextError::DeadlineExceeded).kind(),
            ErrorKind::Aborted
        );
    }

    #[test]
    fn git_not_found_maps_to_not_found() {
        let err: Error = GitError::RefNotFound {
            refname: "refs/heads/x".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn interrupted_plumbing_becomes_context_error() {
        let err = Error::plumbing(
            "push",
            CommandError::Interrupted {
                command: "git push".into(),
                reason: ContextError::Cancelled,
            },
        );
        assert!(matches!(err, Error::Context(ContextError::Cancelled)));
    }

    #[test]
    fn bad_pagination_is_invalid_argument() {
        let err: Error = WalkError::InvalidPagination("page 9".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn conflict_files_are_data() {
        let err = Error::MergeConflict {
            files: vec!["src/lib.rs".into(), "README.md".into()],
        };
        assert_eq!(err.conflict_files().unwrap().len(), 2);
        assert!(err.to_string().contains("2 file(s)"));
    }

    #[test]
    fn sha_mismatch_message() {
        let err = Error::ShaMismatch {
            path: "a.txt".into(),
            given: Oid::new("1".repeat(40)).unwrap(),
            expected: Oid::new("2".repeat(40)).unwrap(),
        };
        assert!(err.to_string().contains("a.txt"));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
