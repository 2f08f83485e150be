//! diff::cut
//!
//! Extracts a bounded line range ("cut") from a single-hunk diff.
//!
//! # Input
//!
//! The diff must be produced with effectively unbounded context
//! (`--unified=100000000`) so the first hunk spans the whole file and line
//! numbers can be counted from its header. Anything after the first hunk
//! (another hunk or another file) ends the scan.
//!
//! # Counting
//!
//! An old-side and a new-side counter start at the hunk header's lines.
//! `-` advances old only, `+` advances new only, context advances both.
//! Each end of the requested range is anchored to one side independently.
//!
//! # Output
//!
//! [`DiffCut::header`] describes only the lines inside the requested range.
//! [`DiffCut::hunk`] adds up to `before_lines` of pre-context and
//! `after_lines` of post-context around them, with a header that matches.

use serde::{Deserialize, Serialize};

use super::circbuf::StrCircBuf;
use super::hunk::{Hunk, HunkHeader, LineKind};
use super::DiffError;

/// Which lines to cut and how much context to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCutParams {
    /// First line of the range.
    pub line_start: usize,
    /// `line_start` counts new-side lines (otherwise old-side).
    pub line_start_new: bool,
    /// Last line of the range, inclusive.
    pub line_end: usize,
    /// `line_end` counts new-side lines (otherwise old-side).
    pub line_end_new: bool,
    /// Lines of context kept before the range.
    pub before_lines: usize,
    /// Lines of context captured after the range.
    pub after_lines: usize,
    /// Cap on range plus post-context lines.
    pub line_limit: usize,
}

impl Default for DiffCutParams {
    fn default() -> Self {
        Self {
            line_start: 1,
            line_start_new: true,
            line_end: 1,
            line_end_new: true,
            before_lines: 2,
            after_lines: 2,
            line_limit: 40,
        }
    }
}

impl DiffCutParams {
    /// Reject ranges that cannot select anything.
    ///
    /// When both ends are on the same side, `line_end` must not precede
    /// `line_start`. Mixed-side ranges cannot be ordered without the diff
    /// and are accepted as given.
    pub fn validate(&self) -> Result<(), DiffError> {
        if self.line_start == 0 || self.line_end == 0 {
            return Err(DiffError::InvalidParams(
                "line numbers start at 1".into(),
            ));
        }
        if self.line_start_new == self.line_end_new && self.line_end < self.line_start {
            return Err(DiffError::InvalidParams(format!(
                "line_end {} precedes line_start {}",
                self.line_end, self.line_start
            )));
        }
        if self.line_limit == 0 {
            return Err(DiffError::InvalidParams("line_limit must be positive".into()));
        }
        Ok(())
    }
}

/// Result of [`diff_cut`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCut {
    /// Header of the requested range only.
    pub header: HunkHeader,
    /// The range plus context, with a header covering all of it.
    pub hunk: Hunk,
}

/// Running old/new position while scanning a hunk body.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    old: usize,
    new: usize,
}

impl Cursor {
    fn advance(&mut self, kind: LineKind) {
        if kind.advances_old() {
            self.old += 1;
        }
        if kind.advances_new() {
            self.new += 1;
        }
    }
}

/// Tally of how many lines touch each side.
#[derive(Debug, Clone, Copy, Default)]
struct Spans {
    old: usize,
    new: usize,
}

impl Spans {
    fn add(&mut self, kind: LineKind) {
        if kind.advances_old() {
            self.old += 1;
        }
        if kind.advances_new() {
            self.new += 1;
        }
    }

    fn of(lines: &[String]) -> Self {
        let mut spans = Spans::default();
        for kind in lines.iter().filter_map(|l| LineKind::of(l)) {
            spans.add(kind);
        }
        spans
    }
}

/// Pulls hunk body lines, stopping at the next hunk or file.
struct BodyReader<I> {
    lines: I,
    done: bool,
}

impl<I, E> BodyReader<I>
where
    I: Iterator<Item = Result<String, E>>,
    DiffError: From<E>,
{
    /// Next content line and its kind, skipping marker lines.
    fn next(&mut self) -> Result<Option<(String, LineKind)>, DiffError> {
        while !self.done {
            let Some(line) = self.lines.next().transpose()? else {
                self.done = true;
                break;
            };
            if line.starts_with("@@ ") || line.starts_with("diff --git ") {
                self.done = true;
                break;
            }
            if let Some(kind) = LineKind::of(&line) {
                return Ok(Some((line, kind)));
            }
        }
        Ok(None)
    }
}

/// Cut the requested line range out of a diff.
///
/// # Errors
///
/// - [`DiffError::InvalidParams`] if the range is unusable (see [`DiffCutParams::validate`])
/// - [`DiffError::HunkNotFound`] if the diff has no hunk or the range lies outside it
///
/// # Example
///
/// ```
/// use gitweave::diff::{diff_cut, DiffCutParams};
///
/// let diff = "@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n";
/// let params = DiffCutParams {
///     line_start: 2, line_start_new: true,
///     line_end: 2, line_end_new: true,
///     before_lines: 1, after_lines: 1, line_limit: 10,
/// };
/// let lines = diff.lines().map(|l| Ok::<_, std::io::Error>(l.to_string()));
/// let cut = diff_cut(lines, &params).unwrap();
/// assert_eq!(cut.header.to_string(), "@@ -2 +2 @@");
/// assert_eq!(cut.hunk.lines, vec![" a", "-b", "+B", " c"]);
/// ```
pub fn diff_cut<I, E>(lines: I, params: &DiffCutParams) -> Result<DiffCut, DiffError>
where
    I: IntoIterator<Item = Result<String, E>>,
    DiffError: From<E>,
{
    params.validate()?;

    let mut lines = lines.into_iter();
    let source_header = loop {
        match lines.next().transpose()? {
            Some(line) => {
                if let Some(header) = HunkHeader::parse(&line) {
                    break header;
                }
            }
            None => return Err(DiffError::HunkNotFound),
        }
    };

    let mut body = BodyReader { lines, done: false };
    let mut pos = Cursor {
        old: source_header.old_line,
        new: source_header.new_line,
    };

    let before_start = |pos: &Cursor| {
        if params.line_start_new {
            pos.new < params.line_start
        } else {
            pos.old < params.line_start
        }
    };
    let past_end = |pos: &Cursor| {
        if params.line_end_new {
            pos.new > params.line_end
        } else {
            pos.old > params.line_end
        }
    };

    let mut before = StrCircBuf::new(params.before_lines);
    let mut cut_start: Option<Cursor> = None;
    let mut cut_lines: Vec<String> = Vec::new();
    let mut cut_spans = Spans::default();

    while !past_end(&pos) && cut_lines.len() < params.line_limit {
        let Some((line, kind)) = body.next()? else {
            break;
        };

        if before_start(&pos) {
            before.push(line);
        } else {
            cut_start.get_or_insert(pos);
            cut_spans.add(kind);
            cut_lines.push(line);
        }
        pos.advance(kind);
    }

    let Some(start) = cut_start else {
        return Err(DiffError::HunkNotFound);
    };

    let header = HunkHeader {
        old_line: line_for_span(start.old, cut_spans.old),
        old_span: cut_spans.old,
        new_line: line_for_span(start.new, cut_spans.new),
        new_span: cut_spans.new,
        text: String::new(),
    };

    let before_lines = before.drain();
    let before_spans = Spans::of(&before_lines);

    let mut after_lines = Vec::new();
    while after_lines.len() < params.after_lines
        && cut_lines.len() + after_lines.len() < params.line_limit
    {
        match body.next()? {
            Some((line, _)) => after_lines.push(line),
            None => break,
        }
    }
    let after_spans = Spans::of(&after_lines);

    let old_span = before_spans.old + cut_spans.old + after_spans.old;
    let new_span = before_spans.new + cut_spans.new + after_spans.new;
    let hunk_header = HunkHeader {
        old_line: line_for_span(start.old - before_spans.old, old_span),
        old_span,
        new_line: line_for_span(start.new - before_spans.new, new_span),
        new_span,
        text: source_header.text,
    };

    let mut hunk_lines = before_lines;
    hunk_lines.extend(cut_lines);
    hunk_lines.extend(after_lines);

    Ok(DiffCut {
        header,
        hunk: Hunk {
            header: hunk_header,
            lines: hunk_lines,
        },
    })
}

/// A side with no lines is written as `0,0`.
fn line_for_span(line: usize, span: usize) -> usize {
    if span == 0 {
        0
    } else {
        line
    }
}

/// Present a whole blob as a single-hunk diff for an added or deleted file.
///
/// Every line is prefixed `+` (added) or `-` (deleted) under a header of
/// `@@ -0,0 +1,N @@` or `@@ -1,N +0,0 @@`, ready for [`diff_cut`].
///
/// Unlike the streamed diff path, the whole blob is decoded and held in
/// memory along with the returned lines.
pub fn blob_as_diff(content: &[u8], added: bool) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    let body: Vec<&str> = text.lines().collect();
    let n = body.len();

    let header = if added {
        HunkHeader {
            old_line: 0,
            old_span: 0,
            new_line: line_for_span(1, n),
            new_span: n,
            text: String::new(),
        }
    } else {
        HunkHeader {
            old_line: line_for_span(1, n),
            old_span: n,
            new_line: 0,
            new_span: 0,
            text: String::new(),
        }
    };
    let prefix = if added { '+' } else { '-' };

    let mut out = Vec::with_capacity(n + 1);
    out.push(header.to_string());
    out.extend(body.into_iter().map(|l| format!("{prefix}{l}")));
    out
}

/// Truncate every line to at most `max_len` bytes on a char boundary.
pub fn limit_line_len(lines: &mut [String], max_len: usize) {
    for line in lines.iter_mut() {
        if line.len() > max_len {
            let mut cut = max_len;
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            line.truncate(cut);
        }
    }
}
