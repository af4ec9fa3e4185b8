//! sticky-core - Core library for Sticky
//!
//! Client-side logic for the sticky notes service: note views and search,
//! the PIN gate in front of private notes, the unseen shared-activity flag,
//! the stored session and the HTTP client. The CLI and any other front end
//! drive everything through [`NotesApp`].

pub mod api;
pub mod app;
pub mod cache;
pub mod error;
pub mod models;
pub mod notify;
pub mod sequence;
pub mod session;
pub mod storage;
pub mod unlock;
pub mod util;
pub mod view;

pub use api::{normalize_base_url, ApiError, HttpNotesClient, NotesApi};
pub use app::{Fetch, Loaded, NotesApp, PinOutcome, ViewChange};
pub use error::{Error, Result, ValidationError};
pub use models::{Change, ChangeType, HistoryEntry, Note, NoteDraft, NoteId, User, UserRef};
pub use notify::SharedActivity;
pub use session::{Session, SessionStore};
pub use storage::{JsonFileStorage, LocalStorage, MemoryStorage};
pub use unlock::{PinPrompt, PrivateGate};
pub use view::View;
