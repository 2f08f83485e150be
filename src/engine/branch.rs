//! engine::branch
//!
//! Branch creation and deletion.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::types::{BranchName, Oid, RefName};

use super::{require_commit, Engine};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranchParams {
    pub repo: PathBuf,
    pub branch_name: String,
    /// Any revision naming a commit
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBranchParams {
    pub repo: PathBuf,
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutput {
    pub name: BranchName,
    pub sha: Oid,
}

impl Engine {
    /// Create a branch at `target`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `target` does not name a commit
    /// - [`Error::AlreadyExists`] if the branch exists
    /// - [`Error::PushRejected`] if the branch appeared concurrently
    pub fn create_branch(
        &self,
        ctx: &RequestContext,
        params: &CreateBranchParams,
    ) -> Result<BranchOutput> {
        let branch = BranchName::new(params.branch_name.as_str())?;
        let git = self.open(&params.repo)?;
        let target = require_commit(&git, &params.target)?;

        if git.branch_commit(&branch)?.is_some() {
            return Err(Error::already_exists("branch", branch.as_str()));
        }

        let scratch = self.linked_scratch(ctx, &git)?;
        scratch.push(ctx, target.as_str(), &RefName::for_branch(&branch), None)?;
        info!(branch = %branch, sha = %target.short(8), "created branch");

        Ok(BranchOutput {
            name: branch,
            sha: target,
        })
    }

    /// Delete a branch, leased on its current tip.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the branch does not exist
    /// - [`Error::InvalidArgument`] for the default branch
    pub fn delete_branch(&self, ctx: &RequestContext, params: &DeleteBranchParams) -> Result<Oid> {
        let branch = BranchName::new(params.branch_name.as_str())?;
        let git = self.open(&params.repo)?;
        let sha = git
            .branch_commit(&branch)?
            .ok_or_else(|| Error::not_found("branch", branch.as_str()))?;
        if git.default_branch()?.as_ref() == Some(&branch) {
            return Err(Error::invalid(format!(
                "cannot delete the default branch '{branch}'"
            )));
        }

        let scratch = self.linked_scratch(ctx, &git)?;
        scratch.push_delete(ctx, &RefName::for_branch(&branch), &sha)?;
        info!(branch = %branch, sha = %sha.short(8), "deleted branch");
        Ok(sha)
    }
}
