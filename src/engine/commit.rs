//! engine::commit
//!
//! Committing a batch of file actions as one commit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::identity::{commit_message, Signature};
use crate::core::types::{BranchName, Oid, RefName};
use crate::sharedrepo::{apply_actions, FileAction, FileActionKind};

use super::Engine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitFilesParams {
    pub repo: PathBuf,
    /// Branch to commit on top of; the default branch when absent
    #[serde(default)]
    pub branch: Option<String>,
    /// Branch to publish to; `branch` when absent
    #[serde(default)]
    pub new_branch: Option<String>,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<Signature>,
    #[serde(default)]
    pub committer: Option<Signature>,
    pub actions: Vec<FileAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFilesOutput {
    pub commit_id: Oid,
    pub branch: BranchName,
}

impl Engine {
    /// Apply `actions` as a single commit and publish it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty batch, a bad path, a
    ///   non-create action on an empty repository, or no identity
    /// - [`Error::NotFound`] if the branch or an updated file is missing
    /// - [`Error::AlreadyExists`] if `new_branch` exists or a created path is taken
    /// - [`Error::ShaMismatch`] if a file changed since the caller read it
    /// - [`Error::PushRejected`] if the branch moved concurrently
    pub fn commit_files(
        &self,
        ctx: &RequestContext,
        params: &CommitFilesParams,
    ) -> Result<CommitFilesOutput> {
        if params.actions.is_empty() {
            return Err(Error::invalid("no file actions to commit"));
        }
        let (author, committer) = Signature::pair(params.author.clone(), params.committer.clone())
            .ok_or_else(|| Error::invalid("an author or committer is required"))?;

        let git = self.open(&params.repo)?;
        let branch = match &params.branch {
            Some(name) => BranchName::new(name.as_str())?,
            None => git
                .default_branch()?
                .ok_or_else(|| Error::invalid("repository has no default branch"))?,
        };
        let new_branch = match &params.new_branch {
            Some(name) => BranchName::new(name.as_str())?,
            None => branch.clone(),
        };

        let scratch = self.scratch(&git)?;
        let parent = if git.has_branches()? {
            if new_branch != branch && git.branch_commit(&new_branch)?.is_some() {
                return Err(Error::already_exists("branch", new_branch.as_str()));
            }
            let parent = git
                .branch_commit(&branch)?
                .ok_or_else(|| Error::not_found("branch", branch.as_str()))?;
            scratch.clone_branch(ctx, &branch)?;
            Some(parent)
        } else {
            if let Some(action) = params
                .actions
                .iter()
                .find(|a| a.kind != FileActionKind::Create)
            {
                return Err(Error::invalid(format!(
                    "repository is empty; cannot {:?} '{}'",
                    action.kind, action.path
                )));
            }
            scratch.init(ctx)?;
            None
        };

        apply_actions(ctx, &scratch, &git, parent.as_ref(), &params.actions)?;
        let tree = scratch.write_tree(ctx)?;
        let message = commit_message(&params.title, &params.message);
        let commit_id = scratch.commit_tree(
            ctx,
            &tree,
            parent.as_ref(),
            &message,
            &author,
            &committer,
        )?;
        debug!(actions = params.actions.len(), tree = %tree.short(8), "built commit");

        let expected = if new_branch == branch {
            parent.as_ref()
        } else {
            None
        };
        scratch.push(
            ctx,
            commit_id.as_str(),
            &RefName::for_branch(&new_branch),
            expected,
        )?;
        info!(branch = %new_branch, commit = %commit_id.short(8), "committed files");

        Ok(CommitFilesOutput {
            commit_id,
            branch: new_branch,
        })
    }
}
