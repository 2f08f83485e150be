//! engine::diff
//!
//! Diff services over two revisions of a repository.
//!
//! The old side is `source` and the new side is `target`. A cut compares
//! the merge base of the two against `target`, so it shows what `target`
//! adds on top of the shared history.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::types::Oid;
use crate::diff::{
    blob_as_diff, diff_cut, get_hunk_headers, limit_line_len, DiffCutParams, DiffError,
    DiffFileHunkHeaders, HunkHeader,
};
use crate::git::{Git, GitCommand};

use super::{require_commit, Engine};

/// Context lines that make one hunk span a whole file.
const WHOLE_FILE_CONTEXT: &str = "--unified=100000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRange {
    pub repo: PathBuf,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffCutRequest {
    pub repo: PathBuf,
    pub source: String,
    pub target: String,
    pub path: String,
    pub params: DiffCutParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffCutOutput {
    /// Header of the requested range only
    pub header: HunkHeader,
    /// Header of the range plus context
    pub lines_header: HunkHeader,
    /// Range plus context, each line with its diff prefix
    pub lines: Vec<String>,
    pub merge_base_sha: Oid,
    pub old_blob_sha: Option<Oid>,
    pub new_blob_sha: Option<Oid>,
}

/// One record of `git diff --raw -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawChange {
    old_blob: Oid,
    new_blob: Oid,
    status: char,
}

impl RawChange {
    /// Parse `:<mode> <mode> <sha> <sha> <status>`.
    fn parse(record: &str) -> Option<Self> {
        let mut fields = record.strip_prefix(':')?.split_whitespace();
        let _old_mode = fields.next()?;
        let _new_mode = fields.next()?;
        let old_blob = Oid::new(fields.next()?).ok()?;
        let new_blob = Oid::new(fields.next()?).ok()?;
        let status = fields.next()?.chars().next()?;
        Some(Self {
            old_blob,
            new_blob,
            status,
        })
    }
}

fn non_zero(oid: Oid) -> Option<Oid> {
    (!oid.is_zero()).then_some(oid)
}

impl Engine {
    /// Cut parameters with context sizes from configuration.
    pub fn default_cut_params(&self) -> DiffCutParams {
        DiffCutParams {
            before_lines: self.config.diff_cut_before_lines(),
            after_lines: self.config.diff_cut_after_lines(),
            line_limit: self.config.diff_cut_line_limit(),
            ..DiffCutParams::default()
        }
    }

    /// Hunk headers of every file changed between `source` and `target`.
    pub fn get_diff_hunk_headers(
        &self,
        ctx: &RequestContext,
        range: &DiffRange,
    ) -> Result<Vec<DiffFileHunkHeaders>> {
        let git = self.open(&range.repo)?;
        let source = require_commit(&git, &range.source)?;
        let target = require_commit(&git, &range.target)?;

        let lines = self
            .diff_command(&git)
            .arg("--unified=0")
            .arg(source.as_str())
            .arg(target.as_str())
            .stream(ctx)
            .map_err(DiffError::from)?;
        Ok(get_hunk_headers(lines)?)
    }

    /// Cut a line range out of the change to one file.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `source` equals `target` or the
    ///   parameters select nothing
    /// - [`Error::NotFound`] if the file is unchanged or no hunk covers the range
    /// - [`Error::UnrelatedHistories`] if the revisions share no history
    pub fn diff_cut(&self, ctx: &RequestContext, request: &DiffCutRequest) -> Result<DiffCutOutput> {
        if request.source == request.target {
            return Err(Error::invalid("source and target are the same"));
        }
        request.params.validate()?;

        let git = self.open(&request.repo)?;
        let source = require_commit(&git, &request.source)?;
        let target = require_commit(&git, &request.target)?;
        let merge_base = git
            .merge_base(&source, &target)?
            .ok_or(Error::UnrelatedHistories)?;

        let change = self.raw_change(ctx, &git, &merge_base, &target, &request.path)?;
        debug!(path = %request.path, status = %change.status, "cutting diff");

        // Added and deleted files are read whole; modified files stream.
        let cut = match change.status {
            'A' => {
                let lines = blob_as_diff(&git.read_blob(&change.new_blob)?, true);
                diff_cut(lines.into_iter().map(Ok::<_, DiffError>), &request.params)?
            }
            'D' => {
                let lines = blob_as_diff(&git.read_blob(&change.old_blob)?, false);
                diff_cut(lines.into_iter().map(Ok::<_, DiffError>), &request.params)?
            }
            _ => {
                let lines = self
                    .diff_command(&git)
                    .arg(WHOLE_FILE_CONTEXT)
                    .arg(merge_base.as_str())
                    .arg(target.as_str())
                    .arg("--")
                    .arg(&request.path)
                    .stream(ctx)
                    .map_err(DiffError::from)?;
                diff_cut(lines, &request.params)?
            }
        };

        let mut lines = cut.hunk.lines;
        limit_line_len(&mut lines, self.config.max_line_length());
        Ok(DiffCutOutput {
            header: cut.header,
            lines_header: cut.hunk.header,
            lines,
            merge_base_sha: merge_base,
            old_blob_sha: non_zero(change.old_blob),
            new_blob_sha: non_zero(change.new_blob),
        })
    }

    fn diff_command(&self, git: &Git) -> GitCommand {
        GitCommand::new("diff")
            .binary(self.config.git_binary())
            .dir(git.git_dir())
            .args(["--patch", "--full-index", "--no-color"])
    }

    fn raw_change(
        &self,
        ctx: &RequestContext,
        git: &Git,
        old: &Oid,
        new: &Oid,
        path: &str,
    ) -> Result<RawChange> {
        let out = GitCommand::new("diff")
            .binary(self.config.git_binary())
            .dir(git.git_dir())
            .args(["--raw", "--no-abbrev", "--no-renames", "-z"])
            .arg(old.as_str())
            .arg(new.as_str())
            .arg("--")
            .arg(path)
            .run(ctx)
            .map_err(|e| Error::plumbing("diff --raw", e))?;
        out.stdout_nul_separated()
            .first()
            .and_then(|record| RawChange::parse(record))
            .ok_or_else(|| Error::not_found("file change", path))
    }
}
