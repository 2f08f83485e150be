//! diff::hunk
//!
//! Hunk headers, hunks, and the line-level grammar of unified diffs.

use serde::{Deserialize, Serialize};

/// The `@@ -old[,span] +new[,span] @@ [text]` line of a hunk.
///
/// A missing span means 1. Display omits a span of exactly 1, matching git.
///
/// # Example
///
/// ```
/// use gitweave::diff::HunkHeader;
///
/// let header = HunkHeader::parse("@@ -7,3 +7,4 @@ fn main()").unwrap();
/// assert_eq!((header.old_line, header.old_span), (7, 3));
/// assert_eq!((header.new_line, header.new_span), (7, 4));
/// assert_eq!(header.text, "fn main()");
///
/// let cut = HunkHeader { old_line: 6, old_span: 3, new_line: 7, new_span: 1, text: String::new() };
/// assert_eq!(cut.to_string(), "@@ -6,3 +7 @@");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkHeader {
    pub old_line: usize,
    pub old_span: usize,
    pub new_line: usize,
    pub new_span: usize,
    pub text: String,
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((line, span)) => Some((line.parse().ok()?, span.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

impl HunkHeader {
    /// Parse a hunk header line. Returns `None` if the line is not one.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("@@ -")?;
        let (ranges, tail) = rest.split_once(" @@")?;
        let (old, new) = ranges.split_once(" +")?;
        let (old_line, old_span) = parse_range(old)?;
        let (new_line, new_span) = parse_range(new)?;
        let text = tail.strip_prefix(' ').unwrap_or(tail);

        Some(Self {
            old_line,
            old_span,
            new_line,
            new_span,
            text: text.to_string(),
        })
    }

    pub fn is_zero(&self) -> bool {
        self.old_line == 0 && self.old_span == 0 && self.new_line == 0 && self.new_span == 0
    }

    /// Each side is either the zero pair or has both line and span positive.
    pub fn is_valid(&self) -> bool {
        fn side_ok(line: usize, span: usize) -> bool {
            (line == 0 && span == 0) || (line > 0 && span > 0)
        }
        !self.is_zero()
            && side_ok(self.old_line, self.old_span)
            && side_ok(self.new_line, self.new_span)
    }
}

impl std::fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@@ -{}", self.old_line)?;
        if self.old_span != 1 {
            write!(f, ",{}", self.old_span)?;
        }
        write!(f, " +{}", self.new_line)?;
        if self.new_span != 1 {
            write!(f, ",{}", self.new_span)?;
        }
        f.write_str(" @@")?;
        if !self.text.is_empty() {
            write!(f, " {}", self.text)?;
        }
        Ok(())
    }
}

/// A header plus the lines it covers, each with its diff prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub header: HunkHeader,
    pub lines: Vec<String>,
}

/// How a hunk body line affects the old/new counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

impl LineKind {
    /// Classify a hunk body line by its prefix.
    ///
    /// Returns `None` for lines that carry no content, such as
    /// `\ No newline at end of file`. An empty line is context whose
    /// leading space was stripped in transit.
    pub fn of(line: &str) -> Option<Self> {
        match line.as_bytes().first() {
            None | Some(b' ') => Some(LineKind::Context),
            Some(b'+') => Some(LineKind::Added),
            Some(b'-') => Some(LineKind::Removed),
            _ => None,
        }
    }

    pub fn advances_old(self) -> bool {
        self != LineKind::Added
    }

    pub fn advances_new(self) -> bool {
        self != LineKind::Removed
    }
}

/// Parse the paths out of a `diff --git a/<old> b/<new>` line.
///
/// Paths with spaces are ambiguous in this line; when both sides name the
/// same path the split is made in the middle, otherwise at the first ` b/`.
pub fn parse_diff_git_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("diff --git ")?;
    if rest.starts_with('"') {
        let (old, new) = split_quoted(rest)?;
        return Some((strip_side(&old, "a/"), strip_side(&new, "b/")));
    }

    if rest.len() % 2 == 1 {
        let mid = rest.len() / 2;
        if rest.is_char_boundary(mid) && rest.is_char_boundary(mid + 1) {
            let (old, new) = (&rest[..mid], &rest[mid + 1..]);
            if old.starts_with("a/") && new.starts_with("b/") && old[2..] == new[2..] {
                return Some((old[2..].to_string(), new[2..].to_string()));
            }
        }
    }

    let idx = rest.find(" b/")?;
    Some((strip_side(&rest[..idx], "a/"), strip_side(&rest[idx + 1..], "b/")))
}

fn strip_side(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Split `"a/x y" "b/x y"` (either side may be unquoted).
fn split_quoted(rest: &str) -> Option<(String, String)> {
    let (old, remainder) = take_path_token(rest)?;
    let (new, _) = take_path_token(remainder.trim_start())?;
    Some((old, new))
}

fn take_path_token(s: &str) -> Option<(String, &str)> {
    if let Some(body) = s.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Some((out, &body[i + 1..])),
                '\\' => match chars.next()?.1 {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
        None
    } else {
        match s.find(' ') {
            Some(i) => Some((s[..i].to_string(), &s[i..])),
            None => Some((s.to_string(), "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod header {
        use super::*;

        #[test]
        fn parses_full_form() {
            let h = HunkHeader::parse("@@ -7,3 +7,4 @@").unwrap();
            assert_eq!(
                h,
                HunkHeader {
                    old_line: 7,
                    old_span: 3,
                    new_line: 7,
                    new_span: 4,
                    text: String::new()
                }
            );
        }

        #[test]
        fn missing_span_defaults_to_one() {
            let h = HunkHeader::parse("@@ -5 +6 @@").unwrap();
            assert_eq!((h.old_span, h.new_span), (1, 1));
        }

        #[test]
        fn zero_spans() {
            let h = HunkHeader::parse("@@ -10,0 +11,2 @@ impl Foo").unwrap();
            assert_eq!((h.old_line, h.old_span), (10, 0));
            assert_eq!(h.text, "impl Foo");
        }

        #[test]
        fn rejects_non_headers() {
            assert!(HunkHeader::parse("+@@ -1 +1 @@").is_none());
            assert!(HunkHeader::parse("@@@ -1,2 -1,2 +1,3 @@@").is_none());
            assert!(HunkHeader::parse("@@ -x,1 +1 @@").is_none());
            assert!(HunkHeader::parse("@@ -1,1 +1").is_none());
        }

        #[test]
        fn display_round_trips_git_format() {
            for line in ["@@ -1,2 +1,3 @@", "@@ -6,3 +7 @@", "@@ -0,0 +1,4 @@ text here"] {
                assert_eq!(HunkHeader::parse(line).unwrap().to_string(), line);
            }
        }

        #[test]
        fn validity() {
            assert!(HunkHeader::parse("@@ -1,2 +1,3 @@").unwrap().is_valid());
            assert!(HunkHeader::parse("@@ -0,0 +1,3 @@").unwrap().is_valid());
            assert!(!HunkHeader::parse("@@ -0,0 +0,0 @@").unwrap().is_valid());
            assert!(!HunkHeader::parse("@@ -3,0 +1,3 @@").unwrap().is_valid());
        }
    }

    mod line_kind {
        use super::*;

        #[test]
        fn classification() {
            assert_eq!(LineKind::of(" ctx"), Some(LineKind::Context));
            assert_eq!(LineKind::of(""), Some(LineKind::Context));
            assert_eq!(LineKind::of("+add"), Some(LineKind::Added));
            assert_eq!(LineKind::of("-del"), Some(LineKind::Removed));
            assert_eq!(LineKind::of("\\ No newline at end of file"), None);
        }

        #[test]
        fn counters() {
            assert!(LineKind::Removed.advances_old());
            assert!(!LineKind::Removed.advances_new());
            assert!(LineKind::Context.advances_old() && LineKind::Context.advances_new());
        }
    }

    mod diff_git_line {
        use super::*;

        #[test]
        fn same_path() {
            assert_eq!(
                parse_diff_git_line("diff --git a/src/lib.rs b/src/lib.rs"),
                Some(("src/lib.rs".into(), "src/lib.rs".into()))
            );
        }

        #[test]
        fn same_path_with_space() {
            assert_eq!(
                parse_diff_git_line("diff --git a/my file b/my file"),
                Some(("my file".into(), "my file".into()))
            );
        }

        #[test]
        fn rename() {
            assert_eq!(
                parse_diff_git_line("diff --git a/old.txt b/new.txt"),
                Some(("old.txt".into(), "new.txt".into()))
            );
        }

        #[test]
        fn quoted() {
            assert_eq!(
                parse_diff_git_line(r#"diff --git "a/t\tab" "b/t\tab""#),
                Some(("t\tab".into(), "t\tab".into()))
            );
        }

        #[test]
        fn not_a_header() {
            assert_eq!(parse_diff_git_line("index 123..456"), None);
        }
    }
}
