//! engine::refs
//!
//! Paginated branch and tag listings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::types::{ObjectType, RefName};
use crate::git::Git;
use crate::refs::{
    patterns_from_query, walk_references, HandleAll, Instructor, ObjectTypeFilter, Paginated,
    Reference, ReferenceField, SortField, SortOrder, WalkEntry, WalkOptions, WalkStats,
};

use super::Engine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRefsParams {
    pub repo: PathBuf,
    /// Free-text query, optionally anchored with `^` and `$`
    #[serde(default)]
    pub query: String,
    /// 1-based page; 0 is the first page
    #[serde(default)]
    pub page: usize,
    /// 0 returns every match
    #[serde(default)]
    pub page_size: usize,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
    /// Only references whose target has this type
    #[serde(default)]
    pub object_type: Option<ObjectType>,
}

/// One page of references, names relative to their namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefListing {
    pub references: Vec<Reference>,
    /// References read to produce this page
    pub scanned: usize,
}

impl Engine {
    /// One page of branches matching the query.
    pub fn list_branches(
        &self,
        ctx: &RequestContext,
        params: &ListRefsParams,
    ) -> Result<RefListing> {
        self.list_namespace(ctx, RefName::BRANCH_PREFIX, params)
    }

    /// One page of tags matching the query.
    pub fn list_tags(&self, ctx: &RequestContext, params: &ListRefsParams) -> Result<RefListing> {
        self.list_namespace(ctx, RefName::TAG_PREFIX, params)
    }

    fn list_namespace(
        &self,
        ctx: &RequestContext,
        prefix: &str,
        params: &ListRefsParams,
    ) -> Result<RefListing> {
        let git = self.open(&params.repo)?;
        let base = prefix.trim_end_matches('/');
        let mut options = WalkOptions {
            patterns: patterns_from_query(base, &params.query),
            fields: vec![
                ReferenceField::Name,
                ReferenceField::ObjectName,
                ReferenceField::ObjectType,
            ],
            sort: params.sort,
            order: params.order,
            max_walk_distance: 0,
        };
        debug!(prefix, query = %params.query, page = params.page, "listing references");

        let mut references = Vec::new();
        let collect = |entry: WalkEntry| -> Result<()> {
            let mut reference = Reference::try_from(&entry)?;
            if let Some(short) = reference.name.strip_prefix(prefix) {
                reference.name = short.to_string();
            }
            references.push(reference);
            Ok(())
        };

        let stats = match params.object_type {
            Some(object_type) => {
                let mut pager =
                    Paginated::new(ObjectTypeFilter(object_type), params.page, params.page_size)?;
                self.walk(ctx, &git, &options, &mut pager, collect)?
            }
            None => {
                let mut pager = Paginated::new(HandleAll, params.page, params.page_size)?;
                options.max_walk_distance = pager.max_walk_distance();
                self.walk(ctx, &git, &options, &mut pager, collect)?
            }
        };

        Ok(RefListing {
            references,
            scanned: stats.scanned,
        })
    }

    fn walk<I, H>(
        &self,
        ctx: &RequestContext,
        git: &Git,
        options: &WalkOptions,
        instructor: &mut I,
        handler: H,
    ) -> Result<WalkStats>
    where
        I: Instructor,
        H: FnMut(WalkEntry) -> Result<()>,
    {
        walk_references::<_, _, Error>(
            ctx,
            self.config.git_binary(),
            git.git_dir(),
            options,
            instructor,
            handler,
        )
    }
}
