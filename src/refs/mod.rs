//! refs
//!
//! Streaming, paginated reference walks.
//!
//! # Overview
//!
//! A walk reads references matching glob patterns, projected onto the
//! requested [`ReferenceField`]s, in the requested order. Each entry goes to
//! an [`Instructor`] that answers Handle, Skip or Stop, so a caller can take
//! one page without materializing the namespace.
//!
//! # Modules
//!
//! - [`query`] - free-text query sanitization and pattern building
//! - [`instructor`] - the tri-state decision strategy and [`Paginated`]
//! - [`walker`] - the walk loop and the `for-each-ref` stream

pub mod instructor;
pub mod query;
pub mod walker;

pub use instructor::{HandleAll, Instructor, ObjectTypeFilter, Paginated, WalkInstruction};
pub use query::{patterns_from_query, sanitize_query, SanitizedQuery};
pub use walker::{walk_entries, walk_references, ReferenceStream, WalkOptions, WalkStats};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{ObjectType, Oid};
use crate::git::CommandError;

/// Errors from reference walks.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("malformed for-each-ref output: {0}")]
    MalformedEntry(String),

    #[error("reference is missing field {0:?}")]
    MissingField(ReferenceField),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// A reference attribute a walk can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceField {
    /// Full reference name
    Name,
    /// Target object SHA
    ObjectName,
    /// Target object type
    ObjectType,
    /// Creation date of the target (commit date or tagger date)
    CreatorDate,
}

impl ReferenceField {
    /// The `for-each-ref --format` atom producing this field.
    pub fn as_format_atom(self) -> &'static str {
        match self {
            ReferenceField::Name => "%(refname)",
            ReferenceField::ObjectName => "%(objectname)",
            ReferenceField::ObjectType => "%(objecttype)",
            ReferenceField::CreatorDate => "%(creatordate:iso-strict)",
        }
    }
}

/// Key a walk is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    CreatorDate,
}

impl SortField {
    fn as_git_key(self) -> &'static str {
        match self {
            SortField::Name => "refname",
            SortField::CreatorDate => "creatordate",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" | "refname" => Ok(SortField::Name),
            "date" | "creatordate" => Ok(SortField::CreatorDate),
            other => Err(format!("unknown sort field '{other}'")),
        }
    }
}

/// Requested direction; `Default` lets the sort field decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Default,
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" => Ok(SortOrder::Default),
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// One reference from a walk, holding only the projected fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkEntry {
    fields: BTreeMap<ReferenceField, String>,
}

impl WalkEntry {
    pub fn insert(&mut self, field: ReferenceField, value: String) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: ReferenceField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    fn require(&self, field: ReferenceField) -> Result<&str, WalkError> {
        self.get(field).ok_or(WalkError::MissingField(field))
    }
}

/// An immutable snapshot of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Full reference name
    pub name: String,
    /// Target object
    pub sha: Oid,
    /// Target object type, if it was projected
    pub object_type: Option<ObjectType>,
}

impl TryFrom<&WalkEntry> for Reference {
    type Error = WalkError;

    fn try_from(entry: &WalkEntry) -> Result<Self, Self::Error> {
        let name = entry.require(ReferenceField::Name)?.to_string();
        let sha = Oid::new(entry.require(ReferenceField::ObjectName)?)
            .map_err(|e| WalkError::MalformedEntry(format!("{name}: {e}")))?;
        let object_type = entry
            .get(ReferenceField::ObjectType)
            .map(|t| t.parse::<ObjectType>())
            .transpose()
            .map_err(|e| WalkError::MalformedEntry(format!("{name}: {e}")))?;
        Ok(Self {
            name,
            sha,
            object_type,
        })
    }
}
