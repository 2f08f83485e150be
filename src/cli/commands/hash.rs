//! hash command - Print the repository hash

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::context::RequestContext;
use crate::engine::{Engine, HashRepositoryParams};
use crate::hash::{AggregationType, HashType};

use super::print_json;

/// Hash the references of `repo`.
pub fn hash(
    engine: &Engine,
    repo: &Path,
    hash_type: Option<HashType>,
    aggregation: Option<AggregationType>,
) -> Result<()> {
    let params = HashRepositoryParams {
        repo: repo.to_path_buf(),
        hash_type,
        aggregation,
    };
    let hash = engine
        .hash_repository(&RequestContext::background(), &params)
        .with_context(|| format!("failed to hash {}", repo.display()))?;
    print_json(&hash)
}
