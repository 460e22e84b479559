//! Per-user cooldown between admitted events.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use gatehouse_types::identity::UserId;

/// Tracks the last admitted timestamp per user.
#[derive(Debug)]
pub struct CooldownTracker {
    last_use: DashMap<UserId, Instant>,
    interval: Duration,
}

impl CooldownTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_use: DashMap::new(),
            interval,
        }
    }

    /// Time the user still has to wait, or `None` when clear to go.
    pub fn remaining(&self, user: UserId) -> Option<Duration> {
        let last = *self.last_use.get(&user)?;
        let elapsed = Instant::now() - last;
        (elapsed < self.interval).then(|| self.interval - elapsed)
    }

    /// Record the admission time for an admitted event.
    pub fn stamp(&self, user: UserId) {
        self.last_use.insert(user, Instant::now());
    }
}
