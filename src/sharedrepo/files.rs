//! sharedrepo::files
//!
//! File actions applied to a scratch index.
//!
//! All actions of one commit accumulate in the same index, so the batch
//! becomes exactly one tree. Existing state is read from the parent commit
//! through the origin's object database.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::context::RequestContext;
use crate::core::errors::{Error, Result};
use crate::core::paths::{clean_upload_path, parent_prefixes};
use crate::core::types::Oid;
use crate::git::{EntryKind, Git, TreeEntryInfo};

use super::{FileMode, SharedRepo};

/// Payload prefix naming a move destination.
const MOVE_PAYLOAD_PREFIX: &str = "file://";

/// What an action does to its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileActionKind {
    Create,
    Update,
    Move,
    Delete,
}

/// One change in a file commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAction {
    pub kind: FileActionKind,
    pub path: String,
    /// New content. For a move without `destination`, `file://<newpath>`
    /// optionally followed by a newline and the new content.
    #[serde(default)]
    pub payload: Vec<u8>,
    /// Blob the path must currently hold.
    #[serde(default)]
    pub sha: Option<Oid>,
    /// Move destination.
    #[serde(default)]
    pub destination: Option<String>,
    /// Mode for created files.
    #[serde(default)]
    pub executable: bool,
}

impl FileAction {
    fn new(kind: FileActionKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            payload: Vec::new(),
            sha: None,
            destination: None,
            executable: false,
        }
    }

    pub fn create(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: content.into(),
            ..Self::new(FileActionKind::Create, path)
        }
    }

    pub fn update(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: content.into(),
            ..Self::new(FileActionKind::Update, path)
        }
    }

    /// Move `path` to `destination`, keeping its content.
    pub fn rename(path: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::new(FileActionKind::Move, path)
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(FileActionKind::Delete, path)
    }

    /// Require the path to currently hold `sha`.
    pub fn expecting(mut self, sha: Oid) -> Self {
        self.sha = Some(sha);
        self
    }

    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    /// Destination and optional replacement content of a move.
    fn move_target(&self) -> Result<(String, Option<Vec<u8>>)> {
        if let Some(destination) = &self.destination {
            let content = (!self.payload.is_empty()).then(|| self.payload.clone());
            return Ok((destination.clone(), content));
        }
        parse_move_payload(&self.payload).ok_or_else(|| {
            Error::invalid(format!("move of '{}' has no destination", self.path))
        })
    }
}

/// Split a `file://<newpath>[\n<content>]` move payload.
pub fn parse_move_payload(payload: &[u8]) -> Option<(String, Option<Vec<u8>>)> {
    let rest = payload.strip_prefix(MOVE_PAYLOAD_PREFIX.as_bytes())?;
    let (path, content) = match rest.iter().position(|b| *b == b'\n') {
        Some(idx) => (&rest[..idx], Some(rest[idx + 1..].to_vec())),
        None => (rest, None),
    };
    let path = String::from_utf8_lossy(path).trim().to_string();
    if path.is_empty() {
        return None;
    }
    Some((path, content))
}

fn cleaned(path: &str) -> Result<String> {
    clean_upload_path(path).ok_or_else(|| Error::invalid(format!("invalid path '{path}'")))
}

/// Apply `actions` to the scratch index on top of `parent`.
///
/// `parent` is `None` for the first commit of an empty repository.
pub fn apply_actions(
    ctx: &RequestContext,
    scratch: &SharedRepo,
    origin: &Git,
    parent: Option<&Oid>,
    actions: &[FileAction],
) -> Result<()> {
    for action in actions {
        ctx.check()?;
        let path = cleaned(&action.path)?;
        debug!(kind = ?action.kind, path = %path, "applying file action");
        match action.kind {
            FileActionKind::Create => {
                check_path_available(origin, parent, &path, true)?;
                let blob = scratch.write_object(ctx, &action.payload)?;
                let mode = if action.executable {
                    FileMode::Executable
                } else {
                    FileMode::Regular
                };
                scratch.add_to_index(ctx, mode, &blob, &path)?;
            }
            FileActionKind::Update => {
                let entry = file_entry(origin, parent, &path, action.sha.as_ref())?;
                let blob = scratch.write_object(ctx, &action.payload)?;
                scratch.add_to_index(ctx, mode_of(&entry), &blob, &path)?;
            }
            FileActionKind::Move => {
                let entry = file_entry(origin, parent, &path, action.sha.as_ref())?;
                let (destination, content) = action.move_target()?;
                let destination = cleaned(&destination)?;
                check_path_available(origin, parent, &destination, true)?;
                let blob = match content {
                    Some(content) => scratch.write_object(ctx, &content)?,
                    None => entry.oid.clone(),
                };
                scratch.add_to_index(ctx, mode_of(&entry), &blob, &destination)?;
                scratch.remove_from_index(ctx, &[path.as_str()])?;
            }
            FileActionKind::Delete => {
                // The index holds earlier actions of this batch, the parent
                // tree does not.
                if action.sha.is_some() {
                    file_entry(origin, parent, &path, action.sha.as_ref())?;
                }
                if scratch.ls_files(ctx, &[path.as_str()])?.is_empty() {
                    return Err(Error::not_found("file", path));
                }
                scratch.remove_from_index(ctx, &[path.as_str()])?;
            }
        }
    }
    Ok(())
}

fn mode_of(entry: &TreeEntryInfo) -> FileMode {
    if entry.kind == EntryKind::Executable {
        FileMode::Executable
    } else {
        FileMode::Regular
    }
}

/// Check that `path` can be written in `commit`'s tree.
///
/// Every parent segment must be a directory or absent. The path itself must
/// not be a symlink or directory, and for a create must not exist at all.
///
/// # Errors
///
/// - [`Error::PathConflict`] if something other than a directory blocks a
///   parent segment, or the path is a directory or symlink
/// - [`Error::AlreadyExists`] if creating over an existing file
pub fn check_path_available(
    origin: &Git,
    commit: Option<&Oid>,
    path: &str,
    is_create: bool,
) -> Result<()> {
    let Some(commit) = commit else {
        return Ok(());
    };
    for prefix in parent_prefixes(path) {
        match origin.tree_entry(commit, prefix)? {
            Some(entry) if entry.kind != EntryKind::Dir => {
                return Err(Error::PathConflict {
                    path: prefix.to_string(),
                    reason: format!("a file exists where '{path}' needs a directory"),
                });
            }
            Some(_) => {}
            // Nothing deeper can exist either.
            None => return Ok(()),
        }
    }
    match origin.tree_entry(commit, path)? {
        Some(entry) if entry.kind == EntryKind::Symlink => Err(Error::PathConflict {
            path: path.to_string(),
            reason: "a symbolic link exists at this path".into(),
        }),
        Some(entry) if entry.kind == EntryKind::Dir => Err(Error::PathConflict {
            path: path.to_string(),
            reason: "a directory exists at this path".into(),
        }),
        Some(_) if is_create => Err(Error::already_exists("file", path)),
        _ => Ok(()),
    }
}

/// The existing file at `path`, checked against an expected blob.
///
/// # Errors
///
/// - [`Error::NotFound`] if nothing is at `path`
/// - [`Error::ShaMismatch`] if `expected` is given and differs
fn file_entry(
    origin: &Git,
    commit: Option<&Oid>,
    path: &str,
    expected: Option<&Oid>,
) -> Result<TreeEntryInfo> {
    let entry = match commit {
        Some(commit) => origin.tree_entry(commit, path)?,
        None => None,
    };
    let entry = entry.ok_or_else(|| Error::not_found("file", path))?;
    if let Some(expected) = expected {
        if *expected != entry.oid {
            return Err(Error::ShaMismatch {
                path: path.to_string(),
                given: expected.clone(),
                expected: entry.oid,
            });
        }
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod move_payload {
        use super::*;

        #[test]
        fn destination_only() {
            assert_eq!(
                parse_move_payload(b"file://docs/new.md"),
                Some(("docs/new.md".to_string(), None))
            );
        }

        #[test]
        fn destination_and_content() {
            assert_eq!(
                parse_move_payload(b"file://new.txt\nhello\nworld"),
                Some(("new.txt".to_string(), Some(b"hello\nworld".to_vec())))
            );
        }

        #[test]
        fn empty_content_is_kept() {
            assert_eq!(
                parse_move_payload(b"file://new.txt\n"),
                Some(("new.txt".to_string(), Some(Vec::new())))
            );
        }

        #[test]
        fn not_framed() {
            assert_eq!(parse_move_payload(b"plain content"), None);
            assert_eq!(parse_move_payload(b"file://"), None);
        }
    }

    mod actions {
        use super::*;

        #[test]
        fn explicit_destination_wins() {
            let action = FileAction::rename("a.txt", "b.txt");
            assert_eq!(action.move_target().unwrap(), ("b.txt".to_string(), None));
        }

        #[test]
        fn framed_destination() {
            let action = FileAction {
                payload: b"file://c.txt\nnew".to_vec(),
                ..FileAction::new(FileActionKind::Move, "a.txt")
            };
            assert_eq!(
                action.move_target().unwrap(),
                ("c.txt".to_string(), Some(b"new".to_vec()))
            );
        }

        #[test]
        fn move_without_destination_is_invalid() {
            let action = FileAction::new(FileActionKind::Move, "a.txt");
            assert!(matches!(
                action.move_target(),
                Err(Error::InvalidArgument(_))
            ));
        }

        #[test]
        fn bad_paths_rejected() {
            assert!(cleaned("/").is_err());
            assert!(cleaned("a/.GIT/hooks").is_err());
            assert_eq!(cleaned("/a/./b").unwrap(), "a/b");
        }
    }
}
