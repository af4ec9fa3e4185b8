//! Data models for Sticky Notes

mod history;
mod note;
mod user;

pub use history::{Change, ChangeType, HistoryEntry};
pub use note::{Note, NoteDraft, NoteId, UserRef};
pub use user::User;

#[cfg(test)]
pub(crate) use note::test_note;
