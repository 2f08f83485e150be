//! refs::walker
//!
//! Streaming reference walks over `git for-each-ref`.

use std::path::Path;

use tracing::debug;

use crate::core::context::RequestContext;
use crate::git::{GitCommand, LineStream};

use super::instructor::{Instructor, WalkInstruction};
use super::{ReferenceField, SortField, SortOrder, WalkEntry, WalkError};

/// Field separator inside one `for-each-ref` output line.
const FIELD_SEPARATOR: char = '\0';

/// What to walk and how to order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Glob patterns; empty walks every reference.
    pub patterns: Vec<String>,
    /// Fields to project; empty means name and target.
    pub fields: Vec<ReferenceField>,
    pub sort: SortField,
    pub order: SortOrder,
    /// Most references to read, `0` for all.
    pub max_walk_distance: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            fields: vec![ReferenceField::Name, ReferenceField::ObjectName],
            sort: SortField::Name,
            order: SortOrder::Default,
            max_walk_distance: 0,
        }
    }
}

impl WalkOptions {
    fn effective_fields(&self) -> Vec<ReferenceField> {
        if self.fields.is_empty() {
            vec![ReferenceField::Name, ReferenceField::ObjectName]
        } else {
            self.fields.clone()
        }
    }

    /// `--sort` argument: creator date sorts newest first unless asked otherwise.
    pub fn sort_arg(&self) -> String {
        let descending = match self.sort {
            SortField::Name => self.order == SortOrder::Desc,
            SortField::CreatorDate => self.order != SortOrder::Asc,
        };
        let key = self.sort.as_git_key();
        if descending {
            format!("-{key}")
        } else {
            key.to_string()
        }
    }

    fn format_arg(fields: &[ReferenceField]) -> String {
        fields
            .iter()
            .map(|f| f.as_format_atom())
            .collect::<Vec<_>>()
            .join("%00")
    }
}

/// Counts from a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// References read from the source.
    pub scanned: usize,
    /// References passed to the handler.
    pub handled: usize,
}

/// Drive a walk over any entry source.
///
/// Pulls entries until the source ends, `max_walk_distance` entries have
/// been read, or the instructor says stop.
///
/// # Errors
///
/// The first error from the source or the handler ends the walk.
pub fn walk_entries<S, I, H, E>(
    source: S,
    instructor: &mut I,
    max_walk_distance: usize,
    mut handler: H,
) -> Result<WalkStats, E>
where
    S: IntoIterator<Item = Result<WalkEntry, E>>,
    I: Instructor + ?Sized,
    H: FnMut(WalkEntry) -> Result<(), E>,
{
    let mut stats = WalkStats::default();
    for entry in source {
        if max_walk_distance > 0 && stats.scanned >= max_walk_distance {
            break;
        }
        let entry = entry?;
        stats.scanned += 1;
        match instructor.instruct(&entry) {
            WalkInstruction::Handle => {
                handler(entry)?;
                stats.handled += 1;
            }
            WalkInstruction::Skip => {}
            WalkInstruction::Stop => break,
        }
    }
    Ok(stats)
}

/// Pull iterator of projected references from a running `for-each-ref`.
#[derive(Debug)]
pub struct ReferenceStream {
    lines: LineStream,
    fields: Vec<ReferenceField>,
}

impl ReferenceStream {
    /// Start `git for-each-ref` in `repo` with the given options.
    pub fn open(
        ctx: &RequestContext,
        git_binary: &str,
        repo: &Path,
        options: &WalkOptions,
    ) -> Result<Self, WalkError> {
        let fields = options.effective_fields();
        let mut cmd = GitCommand::new("for-each-ref")
            .binary(git_binary)
            .dir(repo)
            .arg(format!("--format={}", WalkOptions::format_arg(&fields)))
            .arg(format!("--sort={}", options.sort_arg()));
        if options.max_walk_distance > 0 {
            cmd = cmd.arg(format!("--count={}", options.max_walk_distance));
        }
        cmd = cmd.arg("--ignore-case").args(&options.patterns);

        debug!(
            repo = %repo.display(),
            patterns = ?options.patterns,
            sort = %options.sort_arg(),
            "walking references"
        );
        Ok(Self {
            lines: cmd.stream(ctx)?,
            fields,
        })
    }

    fn parse(&self, line: &str) -> Result<WalkEntry, WalkError> {
        let values: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if values.len() != self.fields.len() {
            return Err(WalkError::MalformedEntry(line.replace('\0', " ")));
        }
        let mut entry = WalkEntry::default();
        for (field, value) in self.fields.iter().zip(values) {
            entry.insert(*field, value.to_string());
        }
        Ok(entry)
    }
}

impl Iterator for ReferenceStream {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => return Some(self.parse(&line)),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Walk the references of `repo`, calling `handler` for each one the
/// instructor handles.
pub fn walk_references<I, H, E>(
    ctx: &RequestContext,
    git_binary: &str,
    repo: &Path,
    options: &WalkOptions,
    instructor: &mut I,
    handler: H,
) -> Result<WalkStats, E>
where
    I: Instructor + ?Sized,
    H: FnMut(WalkEntry) -> Result<(), E>,
    E: From<WalkError>,
{
    let stream = ReferenceStream::open(ctx, git_binary, repo, options)?;
    walk_entries(
        stream.map(|entry| entry.map_err(E::from)),
        instructor,
        options.max_walk_distance,
        handler,
    )
}
