//! Client-side view filtering (search + ALL/SHARED/PRIVATE views).
//!
//! Every note belongs to at most one view. [`classify`] decides which, and
//! [`select_visible`] keeps the notes of the requested view that also match
//! the search term, preserving fetch order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Note;

/// Mutually exclusive display filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// The user's own notes that are neither shared nor private
    #[default]
    All,
    /// Notes owned by others, or owned notes shared with someone
    Shared,
    /// The user's own private notes, behind the PIN gate
    Private,
}

impl View {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Shared => "shared",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "shared" => Ok(Self::Shared),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// The view a note is shown in for `username`, if any.
///
/// Private notes owned by someone else belong to no view.
#[must_use]
pub fn classify(note: &Note, username: &str) -> Option<View> {
    let is_owner = note.is_owned_by(username);
    let is_shared = note.is_shared_for(username);

    if note.private {
        is_owner.then_some(View::Private)
    } else if is_shared {
        Some(View::Shared)
    } else {
        Some(View::All)
    }
}

/// Notes visible in `view` whose title or content contains `search_term`
/// (case-insensitive). Fetch order is preserved.
#[must_use]
pub fn select_visible(notes: &[Note], search_term: &str, view: View, username: &str) -> Vec<Note> {
    let term = search_term.to_lowercase();

    notes
        .iter()
        .filter(|note| note.matches_lowercase(&term))
        .filter(|note| classify(note, username) == Some(view))
        .cloned()
        .collect()
}
