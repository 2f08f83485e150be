//! git
//!
//! The two doorways to Git.
//!
//! # Architecture
//!
//! - [`Git`] reads: refs, commits, trees and blobs through `git2`. No other
//!   module imports `git2`.
//! - [`GitCommand`] writes: the plumbing executor runs the native `git` binary
//!   for clones with alternates, index building, commit creation, merges, and
//!   leased pushes. It also streams `for-each-ref` and `diff` output.
//!
//! # Invariants
//!
//! - Reads never mutate the repository
//! - Every subprocess honours the caller's [`RequestContext`](crate::core::context::RequestContext)
//! - All operations return strong types (Oid, BranchName, RefName)

mod command;
mod interface;

pub use command::{CommandError, CommandOutput, GitCommand, LineStream};
pub use interface::{EntryKind, Git, GitError, TreeEntryInfo};
