//! Last fetched note list.

use crate::models::{Note, NoteId};

#[derive(Debug, Clone, Default)]
pub struct NotesCache {
    notes: Vec<Note>,
    fetched_at: Option<i64>,
}

impl NotesCache {
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// When the cached list was fetched (Unix ms), if ever
    pub const fn fetched_at(&self) -> Option<i64> {
        self.fetched_at
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn replace(&mut self, notes: Vec<Note>, now: i64) {
        self.notes = notes;
        self.fetched_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.fetched_at = None;
    }
}
