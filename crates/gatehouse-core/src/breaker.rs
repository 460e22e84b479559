//! Process-wide circuit breaker for the upstream provider.
//!
//! Only throttle signals open the breaker; billing and credential failures
//! are admin problems and blocking other users would not help them. The
//! block duration prefers the provider-declared retry delay, then a delay
//! parsed out of the failure message, then a configured default.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{info, warn};

use gatehouse_types::provider::ProviderFailure;

/// Matches "try again in 2m 30s", "try again in 2m30s", "try again in 45s"
/// (case-insensitive, fractional seconds tolerated).
fn retry_delay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)try again in\s+(?:(\d+)m\s*)?(\d+(?:\.\d+)?)s").unwrap()
    })
}

/// Parse a retry delay out of free-text provider error messages.
pub(crate) fn parse_retry_delay(message: &str) -> Option<Duration> {
    let caps = retry_delay_pattern().captures(message)?;
    let minutes: u64 = caps
        .get(1)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);
    let seconds: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(Duration::from_secs_f64(minutes as f64 * 60.0 + seconds))
}

/// Upstream-health gate shared by all users of one process.
///
/// `blocked_until` is monotonic non-decreasing except through [`clear`].
///
/// [`clear`]: CircuitBreaker::clear
#[derive(Debug)]
pub struct CircuitBreaker {
    blocked_until: Mutex<Option<Instant>>,
    default_block: Duration,
}

impl CircuitBreaker {
    pub fn new(default_block: Duration) -> Self {
        Self {
            blocked_until: Mutex::new(None),
            default_block,
        }
    }

    /// Time remaining until the breaker closes, or `None` when it is closed.
    pub fn remaining(&self) -> Option<Duration> {
        let guard = self.blocked_until.lock().unwrap();
        let until = (*guard)?;
        let now = Instant::now();
        if now < until { Some(until - now) } else { None }
    }

    pub fn is_open(&self) -> bool {
        self.remaining().is_some()
    }

    /// Record a classified provider failure.
    ///
    /// Returns the block applied by this call, if any. `blocked_until`
    /// never moves backwards: a shorter throttle arriving while a longer
    /// block is active leaves the longer block in place.
    pub fn record_failure(&self, failure: &ProviderFailure) -> Option<Duration> {
        let ProviderFailure::Throttled {
            retry_after,
            message,
        } = failure
        else {
            return None;
        };

        let duration = retry_after
            .or_else(|| parse_retry_delay(message))
            .unwrap_or(self.default_block);

        let mut guard = self.blocked_until.lock().unwrap();
        let candidate = Instant::now() + duration;
        let next = match *guard {
            Some(current) if current >= candidate => current,
            _ => candidate,
        };
        *guard = Some(next);
        warn!(block_secs = duration.as_secs(), "circuit breaker opened");
        Some(duration)
    }

    /// Admin override: close the breaker immediately.
    pub fn clear(&self) {
        let mut guard = self.blocked_until.lock().unwrap();
        if guard.take().is_some() {
            info!("circuit breaker cleared");
        }
    }
}
