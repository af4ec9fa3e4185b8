//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::error::ValidationError;

/// Server-assigned note identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Reference to a user by username
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
}

impl UserRef {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A note as seen by the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub owner: UserRef,
    /// Hidden behind the PIN gate
    pub private: bool,
    /// Users the owner shared this note with. Empty for notes owned by others.
    pub shared_with: Vec<UserRef>,
    /// Creation timestamp (Unix ms)
    pub created_at: Option<i64>,
    /// Last update timestamp (Unix ms)
    pub updated_at: Option<i64>,
}

impl Note {
    #[must_use]
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner.username == username
    }

    /// A note is shared when someone else owns it, or when its owner has
    /// shared it with at least one user.
    #[must_use]
    pub fn is_shared_for(&self, username: &str) -> bool {
        !self.is_owned_by(username) || !self.shared_with.is_empty()
    }

    /// Most recent activity, falling back to creation time.
    #[must_use]
    pub fn last_activity(&self) -> Option<i64> {
        self.updated_at.or(self.created_at)
    }

    /// Case-insensitive match of an already lowercased term against title or content.
    #[must_use]
    pub fn matches_lowercase(&self, term: &str) -> bool {
        term.is_empty()
            || self.title.to_lowercase().contains(term)
            || self.content.to_lowercase().contains(term)
    }
}

/// Fields sent when creating or updating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub private: bool,
}

impl NoteDraft {
    /// Build a draft, rejecting empty title or content.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        private: bool,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            title: title.into(),
            content: content.into(),
            private,
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            Err(ValidationError::MissingTitleOrContent)
        } else {
            Ok(())
        }
    }

    /// Draft pre-filled from an existing note, as the edit form is.
    #[must_use]
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            private: note.private,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_note(id: i64, owner: &str, shared_with: &[&str], private: bool) -> Note {
    Note {
        id: NoteId::new(id),
        title: format!("Note {id}"),
        content: format!("content {id}"),
        owner: UserRef::new(owner),
        private,
        shared_with: shared_with.iter().copied().map(UserRef::new).collect(),
        created_at: Some(1_000),
        updated_at: None,
    }
}
