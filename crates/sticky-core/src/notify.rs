//! Unseen shared-activity flag.

use crate::error::Result;
use crate::models::Note;
use crate::storage::{LocalStorage, LAST_VIEWED_SHARED_KEY};
use crate::view::View;

/// What a refresh did to the shared-activity state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedActivity {
    /// Nothing newer than the last visit
    NoChange,
    /// Newer shared activity while another view is open
    Flagged,
    /// Newer shared activity while the shared view is open; treated as seen
    Seen { last_viewed: i64 },
}

/// Tracks whether shared notes changed since the shared view was last opened.
#[derive(Debug, Clone, Default)]
pub struct SharedActivityTracker {
    last_viewed: i64,
    latest_activity: i64,
    flagged: bool,
}

impl SharedActivityTracker {
    #[must_use]
    pub fn new(last_viewed: i64) -> Self {
        Self {
            last_viewed,
            ..Self::default()
        }
    }

    /// Restore from storage; a missing or unreadable value counts as never viewed.
    pub fn load(storage: &impl LocalStorage) -> Result<Self> {
        let last_viewed = storage
            .get(LAST_VIEWED_SHARED_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Ok(Self::new(last_viewed))
    }

    pub fn persist(&self, storage: &impl LocalStorage) -> Result<()> {
        storage.set(LAST_VIEWED_SHARED_KEY, &self.last_viewed.to_string())
    }

    pub const fn last_viewed(&self) -> i64 {
        self.last_viewed
    }

    pub const fn has_unseen(&self) -> bool {
        self.flagged
    }

    /// Compare freshly fetched notes against the last visit.
    pub fn observe(&mut self, notes: &[Note], username: &str, view: View, now: i64) -> SharedActivity {
        let Some(max_updated) = latest_shared_activity(notes, username) else {
            return SharedActivity::NoChange;
        };
        self.latest_activity = self.latest_activity.max(max_updated);

        if max_updated <= self.last_viewed {
            return SharedActivity::NoChange;
        }

        if view == View::Shared {
            let last_viewed = self.mark_seen(now);
            SharedActivity::Seen { last_viewed }
        } else {
            self.flagged = true;
            SharedActivity::Flagged
        }
    }

    /// Opening the shared view clears the flag and records the visit.
    pub fn enter_shared(&mut self, now: i64) -> i64 {
        self.flagged = false;
        self.mark_seen(now)
    }

    // Never move behind activity already observed, even if the local clock lags the server.
    fn mark_seen(&mut self, now: i64) -> i64 {
        self.last_viewed = now.max(self.latest_activity).max(self.last_viewed);
        self.last_viewed
    }
}

/// Newest `updatedAt`/`createdAt` across notes shared for `username`, private ones included.
#[must_use]
pub fn latest_shared_activity(notes: &[Note], username: &str) -> Option<i64> {
    notes
        .iter()
        .filter(|note| note.is_shared_for(username))
        .filter_map(Note::last_activity)
        .max()
}
