//! Actors and roles in the maker-checker flow.

use serde::{Deserialize, Serialize};

/// What an actor is allowed to do to a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Prepares returns and submits them for review.
    Preparer,
    /// Reviews submitted returns; approves or rejects.
    Reviewer,
    /// Files approved returns with the authority.
    Filer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Preparer => "preparer",
            Self::Reviewer => "reviewer",
            Self::Filer => "filer",
        };
        f.write_str(s)
    }
}

/// A person acting on a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier from the calling system.
    pub id: String,
    /// The role the actor is acting in.
    pub role: Role,
}

impl Actor {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
