//! gitweave - transactional git writes, diff analysis and reference walks
//!
//! gitweave is the repository engine behind a git hosting service. It
//! mutates repositories without ever writing to them in place: each write is
//! staged in a private scratch repository and published with a single leased
//! push, so concurrent writers and failed requests never leave partial state.
//!
//! # Architecture
//!
//! - [`engine`] - Operations: branches, tags, file commits, merges, listings, hashes, diffs
//! - [`sharedrepo`] - Scratch repositories, index plumbing and leased pushes
//! - [`diff`] - Hunk header extraction and line-range cuts over unified diffs
//! - [`refs`] - Streaming, paginated reference walks
//! - [`hash`] - Order-independent repository hashing
//! - [`git`] - Read access through git2 and the plumbing subprocess executor
//! - [`core`] - Domain types, errors, configuration, request context
//! - [`cli`] - Command-line interface over the read-side operations
//!
//! # Correctness Invariants
//!
//! 1. The origin repository changes only through leased pushes
//! 2. One request produces at most one new commit per ref
//! 3. Scratch directories are removed on every exit path
//! 4. Streaming inputs are read once, front to back

pub mod cli;
pub mod core;
pub mod diff;
pub mod engine;
pub mod git;
pub mod hash;
pub mod refs;
pub mod sharedrepo;
