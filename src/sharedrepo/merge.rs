//! sharedrepo::merge
//!
//! Merging a head branch into a base branch in a sparse scratch checkout.
//!
//! # Flow
//!
//! 1. Resolve both tips and check the caller's expected head
//! 2. Init a scratch repository reading both object stores via alternates
//! 3. Point local `base` and `tracking` branches at the tips
//! 4. Limit the checkout to paths changed between them
//! 5. `git merge --no-ff` and commit with the given identities
//! 6. Optionally publish the merge commit with a lease on the target ref
//!
//! Only changed paths are materialized, so cost follows the size of the
//! change rather than the size of the repository.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::identity::Signature;
use crate::core::paths::sparse_checkout_pattern;
use crate::core::types::{BranchName, Oid, RefName};
use crate::git::Git;

use super::SharedRepo;

const BASE_REF: &str = "refs/heads/base";
const TRACKING_REF: &str = "refs/heads/tracking";
const UNRELATED_HISTORIES: &str = "refusing to merge unrelated histories";

/// Local config applied before any checkout.
const SCRATCH_MERGE_CONFIG: [(&str, &str); 5] = [
    ("filter.lfs.process", ""),
    ("filter.lfs.clean", ""),
    ("filter.lfs.smudge", ""),
    ("filter.lfs.required", "false"),
    ("core.sparseCheckout", "true"),
];

/// Inputs of a merge.
#[derive(Debug)]
pub struct MergeRequest<'a> {
    /// Repository receiving the merge; the scratch pushes here
    pub base: &'a Git,
    /// Repository holding the head branch (may be the same as `base`)
    pub head: &'a Git,
    pub base_branch: BranchName,
    pub head_branch: BranchName,
    /// Head tip the caller last saw
    pub head_expected_sha: Option<Oid>,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    /// Ref to publish the merge commit to; `None` only checks mergeability
    pub target: Option<RefName>,
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub base_sha: Oid,
    pub head_sha: Oid,
    pub merge_base_sha: Option<Oid>,
    pub merge_sha: Oid,
    /// Commits on head not yet on base
    pub commit_count: usize,
    /// Paths differing between the two tips
    pub changed_file_count: usize,
}

impl SharedRepo {
    /// Merge `request.head_branch` into `request.base_branch`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if either branch is missing
    /// - [`Error::PreconditionFailed`] if head moved from the expected SHA
    /// - [`Error::InvalidArgument`] if head is already contained in base
    /// - [`Error::MergeConflict`] with the conflicting paths
    /// - [`Error::UnrelatedHistories`] if the tips share no history
    /// - [`Error::PushRejected`] if the target moved during the merge
    pub fn merge(&self, ctx: &RequestContext, request: &MergeRequest<'_>) -> Result<MergeOutcome> {
        let base_sha = request
            .base
            .branch_commit(&request.base_branch)?
            .ok_or_else(|| Error::not_found("branch", request.base_branch.as_str()))?;
        let head_sha = request
            .head
            .branch_commit(&request.head_branch)?
            .ok_or_else(|| Error::not_found("branch", request.head_branch.as_str()))?;
        if let Some(expected) = &request.head_expected_sha {
            if *expected != head_sha {
                return Err(Error::PreconditionFailed(format!(
                    "head branch '{}' is at {}, expected {}",
                    request.head_branch, head_sha, expected
                )));
            }
        }

        self.init(ctx)?;
        let base_objects = request.base.objects_dir();
        let head_objects = request.head.objects_dir();
        if base_objects == head_objects {
            self.link_objects(&[base_objects.as_path()])?;
        } else {
            self.link_objects(&[base_objects.as_path(), head_objects.as_path()])?;
        }
        self.update_ref(ctx, BASE_REF, &base_sha)?;
        self.update_ref(ctx, TRACKING_REF, &head_sha)?;
        self.run(
            ctx,
            "symbolic-ref",
            self.git("symbolic-ref").arg("HEAD").arg(BASE_REF),
        )?;

        let scratch = Git::open(self.path())?;
        let merge_base_sha = scratch.merge_base(&base_sha, &head_sha)?;
        if merge_base_sha.as_ref() == Some(&head_sha) {
            return Err(Error::invalid(format!(
                "'{}' has no changes that are not already in '{}'",
                request.head_branch, request.base_branch
            )));
        }

        let changed = self.changed_paths(ctx)?;
        debug!(
            base = %base_sha.short(8),
            head = %head_sha.short(8),
            changed = changed.len(),
            "preparing sparse merge"
        );
        self.write_sparse_checkout(&changed)?;
        for (key, value) in SCRATCH_MERGE_CONFIG {
            self.set_config(ctx, key, value)?;
        }
        self.run(ctx, "read-tree", self.git("read-tree").args(["-mu", "HEAD"]))?;

        self.run_merge(ctx, request)?;
        let merge_sha = self.rev_parse(ctx, "HEAD")?;
        let commit_count = scratch.commit_count(&base_sha, &head_sha)?;
        info!(merge = %merge_sha.short(8), commits = commit_count, "merged");

        if let Some(target) = &request.target {
            let expected = request.base.ref_target(target)?;
            self.push(ctx, merge_sha.as_str(), target, expected.as_ref())?;
        }

        Ok(MergeOutcome {
            base_sha,
            head_sha,
            merge_base_sha,
            merge_sha,
            commit_count,
            changed_file_count: changed.len(),
        })
    }

    fn update_ref(&self, ctx: &RequestContext, refname: &str, oid: &Oid) -> Result<()> {
        self.run(
            ctx,
            "update-ref",
            self.git("update-ref").arg(refname).arg(oid.as_str()),
        )?;
        Ok(())
    }

    fn changed_paths(&self, ctx: &RequestContext) -> Result<Vec<String>> {
        let out = self.run(
            ctx,
            "diff-tree",
            self.git("diff-tree")
                .args(["--no-commit-id", "--name-only", "-r", "-z", "--root"])
                .arg(BASE_REF)
                .arg(TRACKING_REF)
                .arg("--"),
        )?;
        Ok(out.stdout_nul_separated())
    }

    fn write_sparse_checkout(&self, paths: &[String]) -> Result<()> {
        let info = self.path().join(".git").join("info");
        std::fs::create_dir_all(&info)?;
        let mut content = String::new();
        for path in paths {
            content.push_str(&sparse_checkout_pattern(path));
            content.push('\n');
        }
        std::fs::write(info.join("sparse-checkout"), content)?;
        Ok(())
    }

    fn run_merge(&self, ctx: &RequestContext, request: &MergeRequest<'_>) -> Result<()> {
        let merged = self
            .git("merge")
            .args(["--no-ff", "--no-commit", "--no-edit"])
            .arg(TRACKING_REF)
            .envs(request.author.author_env())
            .envs(request.committer.committer_env())
            .run(ctx);
        if let Err(e) = merged {
            if self.has_unresolved_merge() {
                let files = self.conflicted_files(ctx)?;
                warn!(files = files.len(), "merge stopped with conflicts");
                return Err(Error::MergeConflict { files });
            }
            if e.stderr_contains(UNRELATED_HISTORIES) {
                return Err(Error::UnrelatedHistories);
            }
            return Err(Error::plumbing("merge", e));
        }

        self.run(
            ctx,
            "commit",
            self.git("commit")
                .args(["--no-gpg-sign", "--no-verify", "-m"])
                .arg(&request.message)
                .envs(request.author.author_env())
                .envs(request.committer.committer_env()),
        )?;
        Ok(())
    }

    /// The merge left state behind for a human to resolve.
    fn has_unresolved_merge(&self) -> bool {
        self.path().join(".git").join("MERGE_HEAD").exists()
    }

    fn conflicted_files(&self, ctx: &RequestContext) -> Result<Vec<String>> {
        let out = self.run(
            ctx,
            "diff --diff-filter=U",
            self.git("diff").args(["--name-only", "--diff-filter=U", "--relative", "-z"]),
        )?;
        Ok(out.stdout_nul_separated())
    }
}
