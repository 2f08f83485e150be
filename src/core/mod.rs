//! core
//!
//! Domain types, errors, configuration and request context for gitweave.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, TagName, Oid, RefName, ObjectType
//! - [`identity`] - Author/committer identities and commit messages
//! - [`errors`] - Operation-level error and its taxonomy
//! - [`config`] - Configuration schema and loading
//! - [`context`] - Per-request cancellation and deadline
//! - [`paths`] - Upload path cleaning and sparse-checkout patterns
//!
//! # Design Principles
//!
//! - Strong typing rejects invalid names before git sees them
//! - Schemas are strict and self-describing
//! - Error detail is kept as data

pub mod config;
pub mod context;
pub mod errors;
pub mod identity;
pub mod paths;
pub mod types;
