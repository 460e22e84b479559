//! Event-id dedupe registry with lazy TTL eviction.
//!
//! The transport can redeliver an event; within the TTL window only the
//! first delivery of an id is admitted. Expired entries are dropped on
//! access, with an occasional full sweep to bound the map when ids never
//! come back.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use gatehouse_types::identity::EventId;

/// Sweep the whole registry whenever it grows past this many entries.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug)]
pub struct DedupeRegistry {
    entries: DashMap<EventId, Instant>,
    ttl: Duration,
}

impl DedupeRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Whether this event id was already marked within the TTL.
    ///
    /// An expired entry is removed and counts as unseen.
    pub fn seen(&self, id: EventId) -> bool {
        let now = Instant::now();
        // Drop the read guard before the remove below.
        let live = self.entries.get(&id).map(|expires_at| now < *expires_at);
        match live {
            Some(true) => true,
            Some(false) => {
                self.entries.remove(&id);
                false
            }
            None => false,
        }
    }

    /// Mark an event id as handled for the next TTL window.
    pub fn mark(&self, id: EventId) {
        let now = Instant::now();
        self.entries.insert(id, now + self.ttl);
        if self.entries.len() > SWEEP_THRESHOLD {
            self.entries.retain(|_, expires_at| now < *expires_at);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
