//! Per-user rolling-window usage ledger.
//!
//! A window opens on first use and lasts a fixed interval. While the window
//! is live, each admitted event consumes one unit up to the tier limit;
//! once the interval has elapsed, the next access resets the window before
//! evaluating. Pro is unmetered. No refunds.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use gatehouse_types::admission::UsageStatus;
use gatehouse_types::config::QuotaConfig;
use gatehouse_types::identity::UserId;
use gatehouse_types::tier::Tier;

/// Result of checking a user's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerVerdict {
    pub allowed: bool,
    /// Time until the window resets. Zero when no window is open.
    pub resets_in: Duration,
}

#[derive(Debug, Clone, Copy)]
struct UsageWindow {
    count: u32,
    reset_at: Instant,
}

/// Tier-aware rolling-window request counters.
#[derive(Debug)]
pub struct UsageLedger {
    windows: DashMap<UserId, UsageWindow>,
    window_len: Duration,
    free_limit: u32,
    plus_limit: u32,
}

impl UsageLedger {
    pub fn new(config: &QuotaConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window_len: Duration::from_secs(config.window_secs),
            free_limit: config.free_per_window,
            plus_limit: config.plus_per_window,
        }
    }

    fn limit_for(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Free => Some(self.free_limit),
            Tier::Plus => Some(self.plus_limit),
            Tier::Pro => None,
        }
    }

    /// Check whether the user has quota left without consuming anything.
    pub fn check(&self, user: UserId, tier: Tier) -> LedgerVerdict {
        let Some(limit) = self.limit_for(tier) else {
            return LedgerVerdict {
                allowed: true,
                resets_in: Duration::ZERO,
            };
        };

        let now = Instant::now();
        match self.windows.get(&user) {
            Some(window) if now <= window.reset_at => LedgerVerdict {
                allowed: window.count < limit,
                resets_in: window.reset_at - now,
            },
            // Expired or absent: a fresh window would open on consume.
            _ => LedgerVerdict {
                allowed: limit > 0,
                resets_in: Duration::ZERO,
            },
        }
    }

    /// Consume one unit for an admitted event.
    ///
    /// Callers check first; this still resets an expired window so the
    /// count can never carry across windows.
    pub fn consume(&self, user: UserId, tier: Tier) {
        if self.limit_for(tier).is_none() {
            return;
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(user).or_insert(UsageWindow {
            count: 0,
            reset_at: now + self.window_len,
        });
        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window_len;
        }
        entry.count += 1;
    }

    /// Point-in-time usage snapshot for the admin surface.
    pub fn status(&self, user: UserId, tier: Tier) -> UsageStatus {
        let limit = self.limit_for(tier);
        let now = Instant::now();
        match self.windows.get(&user) {
            Some(window) if now <= window.reset_at => UsageStatus {
                used: window.count,
                limit,
                resets_in: Some(window.reset_at - now),
            },
            _ => UsageStatus {
                used: 0,
                limit,
                resets_in: None,
            },
        }
    }
}
