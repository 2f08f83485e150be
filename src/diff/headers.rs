//! diff::headers
//!
//! Scans diff text into per-file hunk header lists.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use super::hunk::{parse_diff_git_line, HunkHeader};
use super::DiffError;

/// Extended header lines recorded into a file's extension map.
///
/// Longer keywords come first so `deleted file mode` is not mistaken for a
/// shorter match.
pub const EXTENDED_HEADERS: [&str; 11] = [
    "dissimilarity index",
    "deleted file mode",
    "similarity index",
    "new file mode",
    "rename from",
    "rename to",
    "copy from",
    "copy to",
    "old mode",
    "new mode",
    "index",
];

/// The `diff --git` line of one file plus its extended headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFileHeader {
    pub old_file_name: String,
    pub new_file_name: String,
    /// Extended header values keyed by header name (`"new file mode"` → `"100644"`).
    pub extensions: BTreeMap<String, String>,
}

/// One file of a diff with its hunk headers in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFileHunkHeaders {
    pub file_header: DiffFileHeader,
    pub hunk_headers: Vec<HunkHeader>,
}

fn parse_extended_header(line: &str) -> Option<(&'static str, &str)> {
    EXTENDED_HEADERS.iter().find_map(|&keyword| {
        let rest = line.strip_prefix(keyword)?;
        let value = rest.strip_prefix(' ')?;
        Some((keyword, value))
    })
}

/// Collect the hunk headers of every file in a diff.
///
/// Pulls lines one at a time; the diff is never held in memory. File records
/// keep the order they appear in.
///
/// # Errors
///
/// - [`DiffError::MissingFileHeader`] if a hunk header precedes any `diff --git` line
/// - read errors from the line source are passed through
///
/// # Example
///
/// ```
/// use gitweave::diff::get_hunk_headers;
///
/// let diff = "diff --git a/f.txt b/f.txt\nindex 1..2 100644\n--- a/f.txt\n+++ b/f.txt\n@@ -7,3 +7,4 @@\n a\n+b\n c\n d\n";
/// let files = get_hunk_headers(diff.lines().map(|l| Ok::<_, std::io::Error>(l.to_string()))).unwrap();
/// assert_eq!(files.len(), 1);
/// assert_eq!(files[0].hunk_headers[0].new_span, 4);
/// assert_eq!(files[0].file_header.extensions["index"], "1..2 100644");
/// ```
pub fn get_hunk_headers<I, E>(lines: I) -> Result<Vec<DiffFileHunkHeaders>, DiffError>
where
    I: IntoIterator<Item = Result<String, E>>,
    DiffError: From<E>,
{
    let mut files = Vec::new();
    let mut current: Option<DiffFileHunkHeaders> = None;

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line?;

        if let Some((old, new)) = parse_diff_git_line(&line) {
            if let Some(done) = current.take() {
                files.push(done);
            }
            current = Some(DiffFileHunkHeaders {
                file_header: DiffFileHeader {
                    old_file_name: old,
                    new_file_name: new,
                    extensions: BTreeMap::new(),
                },
                hunk_headers: Vec::new(),
            });
            continue;
        }

        if let Some(header) = HunkHeader::parse(&line) {
            let file = current
                .as_mut()
                .ok_or(DiffError::MissingFileHeader { line: idx + 1 })?;
            file.hunk_headers.push(header);
            continue;
        }

        if let Some(file) = current.as_mut() {
            if let Some((keyword, value)) = parse_extended_header(&line) {
                file.file_header
                    .extensions
                    .insert(keyword.to_string(), value.to_string());
            }
        }
    }

    if let Some(done) = current {
        files.push(done);
    }
    Ok(files)
}

/// [`get_hunk_headers`] over any buffered reader.
pub fn get_hunk_headers_from_reader<R: BufRead>(
    reader: R,
) -> Result<Vec<DiffFileHunkHeaders>, DiffError> {
    get_hunk_headers(reader.lines())
}
