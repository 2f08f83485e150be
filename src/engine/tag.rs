//! engine::tag
//!
//! Tag creation and deletion.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::identity::Signature;
use crate::core::types::{Oid, RefName, TagName};

use super::{require_commit, Engine};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagParams {
    pub repo: PathBuf,
    pub tag_name: String,
    /// Any revision naming a commit
    pub target: String,
    /// Non-empty makes an annotated tag
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub tagger: Option<Signature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTagParams {
    pub repo: PathBuf,
    pub tag_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOutput {
    pub name: TagName,
    /// What the tag ref points at: the tag object for annotated tags
    pub sha: Oid,
    /// The tagged commit
    pub target: Oid,
    pub annotated: bool,
}

impl Engine {
    /// Create a lightweight or annotated tag.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `target` does not name a commit
    /// - [`Error::AlreadyExists`] if the tag exists
    /// - [`Error::InvalidArgument`] for an annotated tag without a tagger
    pub fn create_tag(&self, ctx: &RequestContext, params: &CreateTagParams) -> Result<TagOutput> {
        let tag = TagName::new(params.tag_name.as_str())?;
        let git = self.open(&params.repo)?;
        let target = require_commit(&git, &params.target)?;

        let refname = RefName::for_tag(&tag);
        if git.ref_target(&refname)?.is_some() {
            return Err(Error::already_exists("tag", tag.as_str()));
        }

        let scratch = self.linked_scratch(ctx, &git)?;
        let message = params.message.trim();
        let annotated = !message.is_empty();
        let sha = if annotated {
            let tagger = params
                .tagger
                .as_ref()
                .ok_or_else(|| Error::invalid("an annotated tag needs a tagger"))?;
            scratch.create_annotated_tag(ctx, &tag, &target, message, tagger)?
        } else {
            target.clone()
        };
        scratch.push(ctx, sha.as_str(), &refname, None)?;
        info!(tag = %tag, sha = %sha.short(8), annotated, "created tag");

        Ok(TagOutput {
            name: tag,
            sha,
            target,
            annotated,
        })
    }

    /// Delete a tag, leased on its current value.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the tag does not exist
    pub fn delete_tag(&self, ctx: &RequestContext, params: &DeleteTagParams) -> Result<Oid> {
        let tag = TagName::new(params.tag_name.as_str())?;
        let git = self.open(&params.repo)?;
        let refname = RefName::for_tag(&tag);
        let sha = git
            .ref_target(&refname)?
            .ok_or_else(|| Error::not_found("tag", tag.as_str()))?;

        let scratch = self.linked_scratch(ctx, &git)?;
        scratch.push_delete(ctx, &refname, &sha)?;
        info!(tag = %tag, "deleted tag");
        Ok(sha)
    }
}
