//! Per-resource request tickets so stale responses can be dropped.
//!
//! Every fetch takes a ticket before it is sent. When the response arrives it
//! is applied only if no newer ticket was issued for the same resource.

use std::collections::HashMap;

use crate::models::NoteId;

/// Something the client fetches and caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Notes,
    UserStatus,
    History(NoteId),
    ShareCandidates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    resource: Resource,
    seq: u64,
}

impl Ticket {
    pub const fn resource(self) -> Resource {
        self.resource
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: HashMap<Resource, u64>,
}

impl RequestSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, resource: Resource) -> Ticket {
        self.next += 1;
        self.latest.insert(resource, self.next);
        Ticket {
            resource,
            seq: self.next,
        }
    }

    /// Whether `ticket` is still the newest one issued for its resource.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get(&ticket.resource) == Some(&ticket.seq)
    }

    /// Forget every outstanding ticket, e.g. after a forced logout.
    pub fn invalidate_all(&mut self) {
        self.latest.clear();
    }
}
