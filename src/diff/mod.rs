//! diff
//!
//! Unified-diff analysis: hunk header extraction and line-range cuts.
//!
//! Pure text processing. Input arrives as a pull iterator of lines
//! (`Iterator<Item = Result<String, E>>`), so a diff streamed from a git
//! subprocess is consumed one line at a time and never buffered whole.
//!
//! # Modules
//!
//! - [`hunk`] - `@@` headers, hunks and line classification
//! - [`headers`] - [`get_hunk_headers`]: per-file hunk header lists
//! - [`cut`] - [`diff_cut`]: a re-headered line range with context
//! - [`circbuf`] - fixed-capacity ring for pre-context

pub mod circbuf;
pub mod cut;
pub mod headers;
pub mod hunk;

pub use circbuf::StrCircBuf;
pub use cut::{blob_as_diff, diff_cut, limit_line_len, DiffCut, DiffCutParams};
pub use headers::{
    get_hunk_headers, get_hunk_headers_from_reader, DiffFileHeader, DiffFileHunkHeaders,
};
pub use hunk::{Hunk, HunkHeader, LineKind};

use thiserror::Error;

use crate::core::errors::ErrorKind;
use crate::git::CommandError;

/// Errors from diff analysis.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A hunk header appeared before any `diff --git` line.
    #[error("hunk header at line {line} precedes any file header")]
    MissingFileHeader { line: usize },

    /// No hunk covers the requested range.
    #[error("hunk not found")]
    HunkNotFound,

    /// Cut parameters cannot select anything.
    #[error("invalid diff cut parameters: {0}")]
    InvalidParams(String),

    #[error("failed to read diff: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to produce diff: {0}")]
    Command(#[from] CommandError),
}

impl DiffError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiffError::MissingFileHeader { .. } | DiffError::InvalidParams(_) => {
                ErrorKind::InvalidArgument
            }
            DiffError::HunkNotFound => ErrorKind::NotFound,
            DiffError::Command(CommandError::Interrupted { .. }) => ErrorKind::Aborted,
            DiffError::Read(_) | DiffError::Command(_) => ErrorKind::Internal,
        }
    }
}
