//! engine
//!
//! The operations the service layer calls.
//!
//! # Architecture
//!
//! Every operation takes a [`RequestContext`] and a plain parameter struct
//! and returns a plain output struct or [`Error`]. Reads go to the
//! repository through [`Git`]; writes go through a [`SharedRepo`] and reach
//! the repository only through a leased push:
//!
//! ```text
//! validate params -> read state (git2) -> scratch plumbing -> leased push
//! ```
//!
//! # Operations
//!
//! | Area     | Operations                                   |
//! |----------|----------------------------------------------|
//! | branches | [`Engine::create_branch`], [`Engine::delete_branch`] |
//! | tags     | [`Engine::create_tag`], [`Engine::delete_tag`] |
//! | commits  | [`Engine::commit_files`]                     |
//! | merge    | [`Engine::merge`]                            |
//! | refs     | [`Engine::list_branches`], [`Engine::list_tags`] |
//! | hash     | [`Engine::hash_repository`]                  |
//! | diff     | [`Engine::get_diff_hunk_headers`], [`Engine::diff_cut`] |
//!
//! # Invariants
//!
//! - A failed operation never leaves a partial change in the repository
//! - Concurrent writers to one ref are arbitrated by the push lease only
//!
//! # Example
//!
//! ```ignore
//! use gitweave::core::config::Config;
//! use gitweave::core::context::RequestContext;
//! use gitweave::engine::{CreateBranchParams, Engine};
//!
//! let engine = Engine::new(Config::load(None)?);
//! let ctx = RequestContext::background();
//! engine.create_branch(&ctx, &CreateBranchParams {
//!     repo: "/srv/repos/project.git".into(),
//!     branch_name: "feature".into(),
//!     target: "main".into(),
//! })?;
//! ```

mod branch;
mod commit;
mod diff;
mod hash;
mod merge;
mod refs;
mod tag;

pub use branch::{BranchOutput, CreateBranchParams, DeleteBranchParams};
pub use commit::{CommitFilesOutput, CommitFilesParams};
pub use diff::{DiffCutOutput, DiffCutRequest, DiffRange};
pub use hash::{HashRepositoryParams, RepoHash};
pub use merge::{MergeParams, MergeRefType};
pub use refs::{ListRefsParams, RefListing};
pub use tag::{CreateTagParams, DeleteTagParams, TagOutput};

use std::path::Path;

use crate::core::config::Config;
use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::git::Git;
use crate::sharedrepo::SharedRepo;

/// Entry point for all operations.
///
/// Holds configuration only, so one engine can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open(&self, repo: &Path) -> Result<Git> {
        Ok(Git::open(repo)?)
    }

    fn scratch(&self, origin: &Git) -> Result<SharedRepo> {
        SharedRepo::new(&self.config, origin)
    }

    /// A scratch repository ready to push objects the origin already has.
    fn linked_scratch(&self, ctx: &RequestContext, origin: &Git) -> Result<SharedRepo> {
        let scratch = self.scratch(origin)?;
        scratch.init(ctx)?;
        Ok(scratch)
    }
}

/// Resolve `rev` to a commit or fail with NotFound.
fn require_commit(git: &Git, rev: &str) -> Result<crate::core::types::Oid> {
    git.try_resolve_commit(rev)?
        .ok_or_else(|| Error::not_found("commit", rev))
}
