//! Admission decision types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of the admission pipeline for one inbound event.
///
/// Exactly one decision is produced per event. `Allow` means every gate
/// passed and the side effects (dedupe mark, quota unit, cooldown stamp,
/// single-flight permit) were applied atomically with the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    /// Same event id already admitted within the dedupe TTL.
    RejectDuplicate,
    /// The circuit breaker is open; nobody gets through.
    RejectBreakerOpen { retry_in: Duration },
    /// The user sent another message before the cooldown elapsed.
    RejectCooldown { retry_in: Duration },
    /// The user's rolling-window quota is spent.
    RejectQuota { retry_in: Duration },
    /// Another provider call is already in flight.
    RejectBusy,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Short notice shown to the user for a rejection. `None` for `Allow`.
    pub fn user_notice(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::RejectDuplicate => None, // silently drop redeliveries
            Decision::RejectBreakerOpen { retry_in } => Some(format!(
                "I'm cooling down, retry in {}s.",
                retry_in.as_secs()
            )),
            Decision::RejectCooldown { retry_in } => Some(format!(
                "Slow down a little — try again in {}s.",
                retry_in.as_secs()
            )),
            Decision::RejectQuota { retry_in } => Some(format!(
                "You're out of requests for this window. Resets in {}s.",
                retry_in.as_secs()
            )),
            Decision::RejectBusy => {
                Some("I'm already working on another request, one moment.".to_string())
            }
        }
    }
}

/// Point-in-time usage snapshot for a user, served by the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatus {
    pub used: u32,
    /// Tier limit for the window; `None` means unmetered (pro).
    pub limit: Option<u32>,
    /// Time until the rolling window resets; `None` when no window is open.
    pub resets_in: Option<Duration>,
}
