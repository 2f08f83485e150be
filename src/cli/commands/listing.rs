//! branches and tags commands - List one page of references

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::args::ListArgs;
use crate::core::context::RequestContext;
use crate::engine::{Engine, ListRefsParams};

use super::print_json;

fn params(engine: &Engine, repo: &Path, args: &ListArgs) -> ListRefsParams {
    ListRefsParams {
        repo: repo.to_path_buf(),
        query: args.query.clone(),
        page: args.page,
        page_size: args
            .limit
            .unwrap_or_else(|| engine.config().default_page_size()),
        sort: args.sort,
        order: args.order,
        object_type: None,
    }
}

pub fn branches(engine: &Engine, repo: &Path, args: &ListArgs) -> Result<()> {
    let listing = engine
        .list_branches(&RequestContext::background(), &params(engine, repo, args))
        .context("failed to list branches")?;
    print_json(&listing.references)
}

pub fn tags(engine: &Engine, repo: &Path, args: &ListArgs) -> Result<()> {
    let listing = engine
        .list_tags(&RequestContext::background(), &params(engine, repo, args))
        .context("failed to list tags")?;
    print_json(&listing.references)
}
