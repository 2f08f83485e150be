//! engine::hash
//!
//! Order-independent fingerprint of a repository's references.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::hash::{serialize_head, serialize_reference, AggregationType, HashType, Hasher};
use crate::refs::{Reference, ReferenceStream, WalkOptions};

use super::Engine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HashRepositoryParams {
    pub repo: PathBuf,
    /// Configured type when absent
    #[serde(default)]
    pub hash_type: Option<HashType>,
    /// Configured aggregation when absent
    #[serde(default)]
    pub aggregation: Option<AggregationType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoHash {
    pub hash_type: HashType,
    pub aggregation: AggregationType,
    /// Lowercase hex of the digest
    pub hash: String,
    #[serde(skip)]
    pub digest: Vec<u8>,
}

impl Engine {
    /// Hash the head pointer and every reference of the repository.
    pub fn hash_repository(
        &self,
        ctx: &RequestContext,
        params: &HashRepositoryParams,
    ) -> Result<RepoHash> {
        let git = self.open(&params.repo)?;
        let hash_type = params.hash_type.unwrap_or_else(|| self.config.hash_type());
        let aggregation = params
            .aggregation
            .unwrap_or_else(|| self.config.aggregation());
        let hasher = Hasher::new(hash_type, aggregation);

        let default_branch = git
            .default_branch()?
            .map(|b| b.to_string())
            .unwrap_or_default();
        let head = std::iter::once(Ok::<_, Error>(serialize_head(&default_branch)));
        let references = ReferenceStream::open(
            ctx,
            self.config.git_binary(),
            git.git_dir(),
            &WalkOptions::default(),
        )?
        .map(|entry| -> Result<Vec<u8>> {
            let reference = Reference::try_from(&entry?)?;
            Ok(serialize_reference(&reference.name, reference.sha.as_str()))
        });

        let digest = hasher.hash(head.chain(references))?;
        debug!(repo = %params.repo.display(), ?hash_type, "hashed repository");
        Ok(RepoHash {
            hash_type,
            aggregation,
            hash: hex::encode(&digest),
            digest,
        })
    }
}
