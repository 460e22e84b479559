//! Bounded, TTL-evicted conversation memory.
//!
//! Memory is keyed by `(user, location)` so two conversations with the
//! same user never bleed into each other. Eviction is lazy: any access to
//! an entry past its idle TTL drops it. Retention keeps the most recent
//! K turn-pairs, evicting oldest-first.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use gatehouse_types::config::MemoryConfig;
use gatehouse_types::identity::ConversationKey;
use gatehouse_types::provider::{ChatTurn, TurnRole};

#[derive(Debug)]
struct MemoryEntry {
    turns: VecDeque<ChatTurn>,
    updated_at: Instant,
}

/// Per-conversation short-term turn history.
#[derive(Debug)]
pub struct ConversationMemoryStore {
    entries: DashMap<ConversationKey, MemoryEntry>,
    ttl: Duration,
    max_turns: usize,
}

impl ConversationMemoryStore {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            // One pair is a user turn plus an assistant turn.
            max_turns: config.max_pairs * 2,
        }
    }

    fn expired(&self, entry: &MemoryEntry, now: Instant) -> bool {
        now - entry.updated_at > self.ttl
    }

    /// Append one turn, refreshing the entry's idle clock.
    pub fn append(&self, key: ConversationKey, role: TurnRole, content: impl Into<String>) {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert_with(|| MemoryEntry {
            turns: VecDeque::new(),
            updated_at: now,
        });
        if self.expired(&entry, now) {
            entry.turns.clear();
        }
        entry.turns.push_back(ChatTurn {
            role,
            content: content.into(),
        });
        while entry.turns.len() > self.max_turns {
            entry.turns.pop_front();
        }
        entry.updated_at = now;
        trace!(%key, turns = entry.turns.len(), "memory appended");
    }

    /// Ordered turn history for a conversation; empty after TTL expiry.
    pub fn read(&self, key: ConversationKey) -> Vec<ChatTurn> {
        let now = Instant::now();
        let stale = match self.entries.get(&key) {
            Some(entry) if !self.expired(&entry, now) => {
                return entry.turns.iter().cloned().collect();
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            self.entries.remove(&key);
        }
        Vec::new()
    }

    /// Drop a conversation's history outright.
    pub fn clear(&self, key: ConversationKey) {
        self.entries.remove(&key);
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
