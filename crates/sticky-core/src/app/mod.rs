//! Application state for one client session.
//!
//! [`NotesApp`] is built once per launch from a [`NotesApi`] and a
//! [`LocalStorage`]. It owns the session, the cached note list, the current
//! view and search term, the private-view gate and the shared-activity
//! tracker. All mutation goes through `&mut self`, so handlers run one at a
//! time.
//!
//! Fetches are split into a ticket and an apply step. The `refresh_*`
//! helpers do both; callers that overlap requests can hold tickets and apply
//! responses in whatever order they complete, and stale ones are dropped.

use crate::api::{ApiError, ApiResult, NotesApi};
use crate::cache::NotesCache;
use crate::error::{Error, Result, ValidationError};
use crate::models::{HistoryEntry, Note, NoteDraft, NoteId, User};
use crate::notify::{SharedActivity, SharedActivityTracker};
use crate::sequence::{RequestSequencer, Resource, Ticket};
use crate::session::{Session, SessionStore};
use crate::storage::LocalStorage;
use crate::unlock::{PinPrompt, PrivateGate, PrivateRequest};
use crate::util::unix_millis_now;
use crate::view::{select_visible, View};

#[cfg(test)]
mod tests;

/// Outcome of a read that tolerates transport failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch<T> {
    /// The response was current and has been applied
    Fresh(T),
    /// A newer request for the same resource was issued; response dropped
    Stale,
    /// The request failed in transit; logged and skipped
    Unavailable,
}

impl<T> Fetch<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetch<U> {
        match self {
            Self::Fresh(value) => Fetch::Fresh(f(value)),
            Self::Stale => Fetch::Stale,
            Self::Unavailable => Fetch::Unavailable,
        }
    }

    pub fn fresh(self) -> Option<T> {
        match self {
            Self::Fresh(value) => Some(value),
            Self::Stale | Self::Unavailable => None,
        }
    }
}

/// What the initial load fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub notes: Fetch<SharedActivity>,
    /// Until this is fresh the private view stays unavailable
    pub has_pin: Fetch<bool>,
}

/// Result of a view switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Switched(View),
    /// The private view is locked; the given PIN form must be completed first
    PinRequired(PinPrompt),
}

/// Result of submitting a PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// The gate is open and the private view is active
    Unlocked,
    /// Wrong PIN; the entry form stays open for another try
    Rejected,
}

pub struct NotesApp<A: NotesApi, S: LocalStorage> {
    api: A,
    sessions: SessionStore<S>,
    session: Option<Session>,
    cache: NotesCache,
    view: View,
    search: String,
    gate: PrivateGate,
    tracker: SharedActivityTracker,
    sequencer: RequestSequencer,
    clock: fn() -> i64,
}

impl<A: NotesApi, S: LocalStorage> NotesApp<A, S> {
    /// Start a session from stored credentials.
    ///
    /// Fails with [`Error::Auth`] when no session is stored.
    pub fn start(api: A, storage: S) -> Result<Self> {
        let sessions = SessionStore::new(storage);
        let session = sessions.require()?;
        let tracker = SharedActivityTracker::load(sessions.storage())?;
        tracing::debug!(username = %session.username, "Starting notes session");

        Ok(Self {
            api,
            sessions,
            session: Some(session),
            cache: NotesCache::default(),
            view: View::All,
            search: String::new(),
            gate: PrivateGate::new(),
            tracker,
            sequencer: RequestSequencer::new(),
            clock: unix_millis_now,
        })
    }

    /// Replace the wall clock (Unix ms).
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub const fn view(&self) -> View {
        self.view
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub const fn gate(&self) -> &PrivateGate {
        &self.gate
    }

    pub const fn cache(&self) -> &NotesCache {
        &self.cache
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.cache.get(id)
    }

    pub const fn has_unseen_shared(&self) -> bool {
        self.tracker.has_unseen()
    }

    pub const fn last_viewed_shared(&self) -> i64 {
        self.tracker.last_viewed()
    }

    /// Cached notes visible in the current view that match the search term.
    pub fn visible_notes(&self) -> Vec<Note> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        select_visible(
            self.cache.notes(),
            &self.search,
            self.view,
            &session.username,
        )
    }

    /// Initial load: notes, then PIN status.
    pub async fn load(&mut self) -> Result<Loaded> {
        let notes = self.refresh_notes().await?;
        let has_pin = self.refresh_user_status().await?;
        Ok(Loaded { notes, has_pin })
    }

    pub fn begin_notes_refresh(&mut self) -> Ticket {
        self.sequencer.issue(Resource::Notes)
    }

    /// Apply a note list response and re-check shared activity.
    pub fn apply_notes(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Note>>,
    ) -> Result<Fetch<SharedActivity>> {
        let notes = match self.accept(ticket, result)? {
            Fetch::Fresh(notes) => notes,
            Fetch::Stale => return Ok(Fetch::Stale),
            Fetch::Unavailable => return Ok(Fetch::Unavailable),
        };

        let username = self.require_session()?.username.clone();
        let now = self.now();
        self.cache.replace(notes, now);

        let activity = self
            .tracker
            .observe(self.cache.notes(), &username, self.view, now);
        match activity {
            SharedActivity::Flagged => tracing::info!("New activity in shared notes"),
            SharedActivity::Seen { .. } => self.tracker.persist(self.sessions.storage())?,
            SharedActivity::NoChange => {}
        }
        Ok(Fetch::Fresh(activity))
    }

    pub async fn refresh_notes(&mut self) -> Result<Fetch<SharedActivity>> {
        let token = self.token()?;
        let ticket = self.begin_notes_refresh();
        let result = self.api.list_notes(&token).await;
        self.apply_notes(ticket, result)
    }

    /// Fetch whether the user has a PIN. Returns the flag when applied.
    pub async fn refresh_user_status(&mut self) -> Result<Fetch<bool>> {
        let token = self.token()?;
        let ticket = self.sequencer.issue(Resource::UserStatus);
        let result = self.api.current_user(&token).await;
        let has_pin = self
            .accept(ticket, result)?
            .map(|user| user.has_private_pin);
        if let Fetch::Fresh(has_pin) = has_pin {
            self.gate.set_has_pin(has_pin);
        }
        Ok(has_pin)
    }

    /// Switch views. Leaving for ALL or SHARED always re-locks private notes.
    ///
    /// The private view is refused with [`ValidationError::PinStatusUnknown`]
    /// until a user status fetch has succeeded.
    pub fn switch_view(&mut self, view: View) -> Result<ViewChange> {
        match view {
            View::All => {
                self.gate.lock();
                self.view = View::All;
            }
            View::Shared => {
                self.gate.lock();
                self.view = View::Shared;
                let now = self.now();
                self.tracker.enter_shared(now);
                self.tracker.persist(self.sessions.storage())?;
            }
            View::Private => match self.gate.request_private()? {
                PrivateRequest::Granted => self.view = View::Private,
                PrivateRequest::Prompt(prompt) => return Ok(ViewChange::PinRequired(prompt)),
            },
        }
        tracing::debug!(view = %view, "View switched");
        Ok(ViewChange::Switched(view))
    }

    /// Submit the open PIN form. The PIN is validated before any request.
    pub async fn submit_pin(&mut self, raw: &str) -> Result<PinOutcome> {
        let (prompt, pin) = self.gate.prepare_submit(raw)?;
        let token = self.token()?;

        let unlocked = match prompt {
            PinPrompt::Setup => {
                if let Err(error) = self.api.set_pin(&token, &pin).await {
                    return Err(self.write_failure(error));
                }
                self.gate.complete_setup(true)
            }
            PinPrompt::Entry => match self.api.verify_pin(&token, &pin).await {
                Ok(valid) => self.gate.complete_entry(valid),
                Err(error) => return Err(self.write_failure(error)),
            },
        };

        if unlocked {
            self.view = View::Private;
            Ok(PinOutcome::Unlocked)
        } else {
            tracing::info!("Incorrect PIN");
            Ok(PinOutcome::Rejected)
        }
    }

    pub fn cancel_pin(&mut self) {
        self.gate.cancel();
    }

    /// Create (`id == None`) or update a note, then refresh the list.
    pub async fn save_note(&mut self, id: Option<NoteId>, draft: &NoteDraft) -> Result<Note> {
        draft.validate()?;
        let token = self.token()?;

        let result = match id {
            Some(id) => self.api.update_note(&token, id, draft).await,
            None => self.api.create_note(&token, draft).await,
        };
        let note = result.map_err(|error| self.write_failure(error))?;
        tracing::info!(note_id = %note.id, "Note saved");

        self.refresh_after_write().await?;
        Ok(note)
    }

    pub async fn delete_note(&mut self, id: NoteId) -> Result<()> {
        let token = self.token()?;
        if let Err(error) = self.api.delete_note(&token, id).await {
            return Err(self.write_failure(error));
        }
        tracing::info!(note_id = %id, "Note deleted");

        self.refresh_after_write().await
    }

    pub async fn history(&mut self, id: NoteId) -> Result<Fetch<Vec<HistoryEntry>>> {
        let token = self.token()?;
        let ticket = self.sequencer.issue(Resource::History(id));
        let result = self.api.note_history(&token, id).await;
        self.accept(ticket, result)
    }

    pub async fn share_candidates(&mut self) -> Result<Fetch<Vec<User>>> {
        let token = self.token()?;
        let ticket = self.sequencer.issue(Resource::ShareCandidates);
        let result = self.api.share_candidates(&token).await;
        self.accept(ticket, result)
    }

    pub async fn share_note(&mut self, id: NoteId, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        let token = self.token()?;
        if let Err(error) = self.api.share_note(&token, id, username).await {
            return Err(self.write_failure(error));
        }
        tracing::info!(note_id = %id, username, "Note shared");
        Ok(())
    }

    /// User-initiated sign out.
    pub fn logout(&mut self) -> Result<()> {
        self.sessions.clear()?;
        self.reset();
        tracing::info!("Signed out");
        Ok(())
    }

    fn accept<T>(&mut self, ticket: Ticket, result: ApiResult<T>) -> Result<Fetch<T>> {
        match result {
            Err(ApiError::Unauthorized) => Err(self.force_logout()),
            _ if !self.sequencer.is_current(ticket) => {
                tracing::debug!(resource = ?ticket.resource(), "Dropping stale response");
                Ok(Fetch::Stale)
            }
            Ok(value) => Ok(Fetch::Fresh(value)),
            Err(ApiError::Network(message)) => {
                tracing::warn!(resource = ?ticket.resource(), "Fetch failed: {}", message);
                Ok(Fetch::Unavailable)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn write_failure(&mut self, error: ApiError) -> Error {
        match error {
            ApiError::Unauthorized => self.force_logout(),
            other => {
                tracing::warn!("Request failed: {}", other);
                other.into()
            }
        }
    }

    async fn refresh_after_write(&mut self) -> Result<()> {
        match self.refresh_notes().await {
            Ok(_) => Ok(()),
            Err(error @ Error::Auth(_)) => Err(error),
            Err(error) => {
                tracing::warn!("Failed to refresh notes after change: {}", error);
                Ok(())
            }
        }
    }

    /// Clear the session after the server rejected the token.
    fn force_logout(&mut self) -> Error {
        tracing::warn!("Session token rejected; signing out");
        if let Err(error) = self.sessions.clear() {
            tracing::warn!("Failed to clear stored session: {}", error);
        }
        self.reset();
        ApiError::Unauthorized.into()
    }

    fn reset(&mut self) {
        self.session = None;
        self.cache.clear();
        self.gate.lock();
        self.view = View::All;
        self.sequencer.invalidate_all();
    }

    fn require_session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::Auth("not signed in; log in to continue".to_string()))
    }

    fn token(&self) -> Result<String> {
        self.require_session().map(|session| session.token.clone())
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }
}
