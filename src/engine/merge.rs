//! engine::merge
//!
//! Merging branches, optionally publishing the result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::identity::Signature;
use crate::core::types::{BranchName, Oid, RefName};
use crate::sharedrepo::{MergeOutcome, MergeRequest};

use super::Engine;

/// Namespace the merge commit is published to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeRefType {
    /// Check mergeability only; nothing is published.
    #[default]
    Undefined,
    /// `ref_name` is a full ref name.
    Raw,
    /// `ref_name` is a branch name.
    Branch,
    /// `ref_name` is a pull request number; publishes `refs/pullreq/<n>/head`.
    PullReqHead,
    /// `ref_name` is a pull request number; publishes `refs/pullreq/<n>/merge`.
    PullReqMerge,
}

impl MergeRefType {
    /// The ref this type and name publish to, `None` for a dry run.
    pub fn target(self, ref_name: &str) -> Result<Option<RefName>> {
        let pullreq = || {
            ref_name
                .parse::<u64>()
                .map_err(|_| Error::invalid(format!("invalid pull request number '{ref_name}'")))
        };
        Ok(match self {
            MergeRefType::Undefined => None,
            MergeRefType::Raw => Some(RefName::new(ref_name)?),
            MergeRefType::Branch => Some(RefName::for_branch(&BranchName::new(ref_name)?)),
            MergeRefType::PullReqHead => Some(RefName::for_pullreq_head(pullreq()?)),
            MergeRefType::PullReqMerge => Some(RefName::for_pullreq_merge(pullreq()?)),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeParams {
    pub base_repo: PathBuf,
    /// Repository of the head branch; `base_repo` when absent
    #[serde(default)]
    pub head_repo: Option<PathBuf>,
    pub base_branch: String,
    pub head_branch: String,
    #[serde(default)]
    pub head_expected_sha: Option<Oid>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<Signature>,
    #[serde(default)]
    pub committer: Option<Signature>,
    #[serde(default)]
    pub ref_type: MergeRefType,
    #[serde(default)]
    pub ref_name: String,
}

impl Engine {
    /// Merge `head_branch` into `base_branch` with a merge commit.
    ///
    /// See [`SharedRepo::merge`](crate::sharedrepo::SharedRepo::merge) for
    /// the error cases.
    pub fn merge(&self, ctx: &RequestContext, params: &MergeParams) -> Result<MergeOutcome> {
        let base_branch = BranchName::new(params.base_branch.as_str())?;
        let head_branch = BranchName::new(params.head_branch.as_str())?;
        let target = params.ref_type.target(&params.ref_name)?;
        let (author, committer) = Signature::pair(params.author.clone(), params.committer.clone())
            .ok_or_else(|| Error::invalid("an author or committer is required"))?;

        let base = self.open(&params.base_repo)?;
        let head = match &params.head_repo {
            Some(path) => Some(self.open(path)?),
            None => None,
        };

        let message = if params.message.trim().is_empty() {
            format!("Merge branch '{head_branch}' into {base_branch}")
        } else {
            params.message.trim().to_string()
        };

        let request = MergeRequest {
            base: &base,
            head: head.as_ref().unwrap_or(&base),
            base_branch,
            head_branch,
            head_expected_sha: params.head_expected_sha.clone(),
            message,
            author,
            committer,
            target,
        };
        self.scratch(&base)?.merge(ctx, &request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_publishes_nothing() {
        assert_eq!(MergeRefType::Undefined.target("ignored").unwrap(), None);
    }

    #[test]
    fn targets_by_type() {
        assert_eq!(
            MergeRefType::Branch.target("main").unwrap().unwrap().as_str(),
            "refs/heads/main"
        );
        assert_eq!(
            MergeRefType::PullReqHead.target("12").unwrap().unwrap().as_str(),
            "refs/pullreq/12/head"
        );
        assert_eq!(
            MergeRefType::PullReqMerge.target("12").unwrap().unwrap().as_str(),
            "refs/pullreq/12/merge"
        );
        assert_eq!(
            MergeRefType::Raw.target("refs/custom/x").unwrap().unwrap().as_str(),
            "refs/custom/x"
        );
    }

    #[test]
    fn pullreq_number_must_parse() {
        assert!(matches!(
            MergeRefType::PullReqMerge.target("abc"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
