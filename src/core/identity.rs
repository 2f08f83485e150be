//! core::identity
//!
//! Author, committer and tagger identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person recorded on a commit or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// An identity with the moment it acted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub identity: Identity,
    pub when: DateTime<Utc>,
}

impl Signature {
    pub fn new(identity: Identity, when: DateTime<Utc>) -> Self {
        Self { identity, when }
    }

    /// Sign as `identity` now.
    pub fn now(identity: Identity) -> Self {
        Self::new(identity, Utc::now())
    }

    /// Fill in a missing author or committer from the other one.
    ///
    /// Returns `None` when neither is given.
    pub fn pair(
        author: Option<Signature>,
        committer: Option<Signature>,
    ) -> Option<(Signature, Signature)> {
        match (author, committer) {
            (Some(a), Some(c)) => Some((a, c)),
            (Some(a), None) => Some((a.clone(), a)),
            (None, Some(c)) => Some((c.clone(), c)),
            (None, None) => None,
        }
    }

    fn env_vars(&self, role: &str) -> [(String, String); 3] {
        [
            (format!("GIT_{role}_NAME"), self.identity.name.clone()),
            (format!("GIT_{role}_EMAIL"), self.identity.email.clone()),
            (format!("GIT_{role}_DATE"), self.when.to_rfc3339()),
        ]
    }

    /// `GIT_AUTHOR_*` variables for this signature.
    pub fn author_env(&self) -> [(String, String); 3] {
        self.env_vars("AUTHOR")
    }

    /// `GIT_COMMITTER_*` variables for this signature.
    pub fn committer_env(&self) -> [(String, String); 3] {
        self.env_vars("COMMITTER")
    }
}

/// Commit message from a title and an optional body.
pub fn commit_message(title: &str, body: &str) -> String {
    let title = title.trim();
    let body = body.trim();
    if body.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{body}")
    }
}
