//! refs::query
//!
//! Free-text reference queries to `for-each-ref` patterns.
//!
//! A query may be anchored: `^foo` matches names starting with `foo`,
//! `foo$` names ending with `foo`, `^foo$` exactly `foo`. Unanchored queries
//! match names containing the text. Characters that can never appear in a
//! ref name are dropped first.

/// A query with its anchors split off and disallowed characters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery {
    pub text: String,
    pub match_prefix: bool,
    pub match_suffix: bool,
}

fn is_disallowed(c: char) -> bool {
    (c as u32) < 32 || matches!(c, '\u{7f}' | ' ' | '~' | '^' | ':' | '?' | '*' | '[')
}

/// Split anchors off `query` and strip characters git forbids in ref names.
///
/// # Example
///
/// ```
/// use gitweave::refs::sanitize_query;
///
/// let q = sanitize_query("^rel*ease$");
/// assert_eq!(q.text, "release");
/// assert!(q.match_prefix && q.match_suffix);
/// ```
pub fn sanitize_query(query: &str) -> SanitizedQuery {
    let match_prefix = query.starts_with('^');
    let match_suffix = query.ends_with('$');
    let body = if match_suffix {
        &query[..query.len() - 1]
    } else {
        query
    };
    SanitizedQuery {
        text: body.chars().filter(|c| !is_disallowed(*c)).collect(),
        match_prefix,
        match_suffix,
    }
}

/// Build walk patterns under `base_path` for a free-text query.
///
/// - no base and no query: no patterns (walk everything)
/// - no query: `[base/]`
/// - `^q$`: exact name
/// - `q$`: any name ending in `q`, at any depth
/// - `^q`: names starting with `q`, as a file or as a folder
/// - `q`: names containing `q`, as a file or as a folder
///
/// # Example
///
/// ```
/// use gitweave::refs::patterns_from_query;
///
/// assert_eq!(
///     patterns_from_query("refs/heads", "^feat"),
///     vec!["refs/heads/feat*", "refs/heads/feat*/**"]
/// );
/// ```
pub fn patterns_from_query(base_path: &str, query: &str) -> Vec<String> {
    if base_path.is_empty() && query.is_empty() {
        return Vec::new();
    }

    let mut base = base_path.to_string();
    if !base.is_empty() && !base.ends_with('/') {
        base.push('/');
    }

    if query.is_empty() {
        return vec![base];
    }

    let SanitizedQuery {
        text,
        match_prefix,
        match_suffix,
    } = sanitize_query(query);

    match (match_prefix, match_suffix) {
        (true, true) => vec![format!("{base}{text}")],
        (false, true) => vec![format!("{base}**/*{text}")],
        (true, false) => vec![format!("{base}{text}*"), format!("{base}{text}*/**")],
        (false, false) => vec![
            format!("{base}**/*{text}*"),
            format!("{base}**/*{text}*/**"),
        ],
    }
}
