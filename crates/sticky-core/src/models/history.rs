//! Note history model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NoteId;

/// Kind of change recorded in a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        };
        f.write_str(label)
    }
}

/// Content captured by a history entry; which side is present depends on the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Change {
    Created { new_content: String },
    Updated { old_content: String, new_content: String },
    Deleted { old_content: String },
}

impl Change {
    #[must_use]
    pub const fn change_type(&self) -> ChangeType {
        match self {
            Self::Created { .. } => ChangeType::Created,
            Self::Updated { .. } => ChangeType::Updated,
            Self::Deleted { .. } => ChangeType::Deleted,
        }
    }

    /// Build from the nullable wire pair, or `None` when the sides don't fit the type.
    #[must_use]
    pub fn from_parts(
        change_type: ChangeType,
        old_content: Option<String>,
        new_content: Option<String>,
    ) -> Option<Self> {
        match (change_type, old_content, new_content) {
            (ChangeType::Created, _, Some(new_content)) => Some(Self::Created { new_content }),
            (ChangeType::Updated, Some(old_content), Some(new_content)) => Some(Self::Updated {
                old_content,
                new_content,
            }),
            (ChangeType::Deleted, Some(old_content), _) => Some(Self::Deleted { old_content }),
            _ => None,
        }
    }
}

/// An immutable record of one change to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub note_id: NoteId,
    #[serde(flatten)]
    pub change: Change,
    /// When the change happened (Unix ms)
    pub timestamp: i64,
}
