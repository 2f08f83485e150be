//! core::paths
//!
//! Repository path handling for file commits and sparse checkouts.
//!
//! # Upload paths
//!
//! Paths arriving with a commit request are cleaned lexically before they
//! reach the index: separators are normalized, `.` segments dropped, `..`
//! resolved without ever climbing above the repository root, and any `.git`
//! segment (in any case) rejects the path outright.
//!
//! # Sparse-checkout patterns
//!
//! Sparse-checkout files use gitignore syntax. Each path is anchored with a
//! leading `/` and its glob metacharacters are escaped so it matches exactly
//! one file.
//!
//! # Example
//!
//! ```
//! use gitweave::core::paths::{clean_upload_path, sparse_checkout_pattern};
//!
//! assert_eq!(clean_upload_path("/docs//./guide.md").as_deref(), Some("docs/guide.md"));
//! assert_eq!(clean_upload_path("src/.git/config"), None);
//! assert_eq!(sparse_checkout_pattern("a[1].txt"), "/a\\[1].txt");
//! ```

/// Clean a user-supplied repository path.
///
/// Returns `None` if nothing is left after cleaning or a segment is `.git`.
pub fn clean_upload_path(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => {
                if s.eq_ignore_ascii_case(".git") {
                    return None;
                }
                segments.push(s);
            }
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Every proper parent of a cleaned path, shortest first.
///
/// `a/b/c.txt` yields `a`, `a/b`.
pub fn parent_prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(idx, _)| &path[..idx])
}

/// Characters with meaning in gitignore-style patterns.
const SPARSE_METACHARS: [char; 7] = ['*', '[', '?', '!', ' ', '\\', '#'];

/// Build an anchored sparse-checkout line matching exactly `path`.
pub fn sparse_checkout_pattern(path: &str) -> String {
    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('/');
    for c in path.chars() {
        if SPARSE_METACHARS.contains(&c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}
