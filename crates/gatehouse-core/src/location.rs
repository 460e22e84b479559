//! Canonical conversation-identity resolution.
//!
//! Every inbound event resolves to exactly one `LocationId`, once, and
//! the result rides with the event through admission, memory, and quota.
//! Resolution priority:
//!
//! 1. direct one-to-one context -> its own channel
//! 2. per-user assist thread -> the thread's channel
//! 3. reply to a recorded system output -> where that output was posted
//! 4. anything else -> the ambient home location

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use gatehouse_types::config::LocationConfig;
use gatehouse_types::event::{ChannelKind, InboundEvent};
use gatehouse_types::identity::{LocationId, MessageId};

/// Sweep the reply index whenever it grows past this many entries.
const SWEEP_THRESHOLD: usize = 4096;

/// Maps inbound events to stable conversation identities.
#[derive(Debug)]
pub struct LocationResolver {
    home: LocationId,
    reply_index: DashMap<MessageId, (LocationId, Instant)>,
    reply_ttl: Duration,
}

impl LocationResolver {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            home: LocationId(config.home_channel),
            reply_index: DashMap::new(),
            reply_ttl: Duration::from_secs(config.reply_index_ttl_secs),
        }
    }

    /// Resolve the canonical location for an inbound event.
    pub fn resolve(&self, event: &InboundEvent) -> LocationId {
        let location = match event.context.kind {
            ChannelKind::Direct => LocationId(event.context.channel),
            ChannelKind::AssistThread { .. } => LocationId(event.context.channel),
            ChannelKind::Shared => event
                .context
                .replied_to
                .and_then(|message| self.recorded_location(message))
                .unwrap_or(self.home),
        };
        trace!(event = %event.id, %location, "location resolved");
        location
    }

    /// Record where a system output was posted so later replies to it
    /// resolve back to the same conversation.
    pub fn record_output(&self, message: MessageId, location: LocationId) {
        let now = Instant::now();
        self.reply_index.insert(message, (location, now + self.reply_ttl));
        if self.reply_index.len() > SWEEP_THRESHOLD {
            self.reply_index.retain(|_, (_, expires_at)| now < *expires_at);
        }
    }

    fn recorded_location(&self, message: MessageId) -> Option<LocationId> {
        let now = Instant::now();
        let hit = self
            .reply_index
            .get(&message)
            .map(|entry| (entry.0, now < entry.1));
        match hit {
            Some((location, true)) => Some(location),
            Some((_, false)) => {
                self.reply_index.remove(&message);
                None
            }
            None => None,
        }
    }
}
