//! Types for the generative-text provider interface.
//!
//! Gatehouse never talks to a provider directly; it classifies provider
//! outcomes into `ProviderFailure` once, at the seam, and everything
//! downstream (breaker, user notices) works off that classification.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A single turn of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Successful reply from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReply {
    pub content: String,
}

/// Classified failure from a provider call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderFailure {
    /// The provider rate-limited us. Opens the circuit breaker.
    #[error("provider throttled: {message}")]
    Throttled {
        /// Retry delay declared by the provider, when present.
        retry_after: Option<Duration>,
        message: String,
    },

    /// Account-level quota or billing exhaustion. Admin problem, not load.
    #[error("provider quota exhausted")]
    QuotaExhausted,

    /// Credential rejected. Deployment problem, not load.
    #[error("provider credential invalid")]
    AuthInvalid,

    /// Anything transient: network, 5xx, malformed response, timeout.
    #[error("provider failure: {0}")]
    Transient(String),
}

impl ProviderFailure {
    /// Short notice shown to the user who triggered the failing call.
    ///
    /// `breaker_wait` is the remaining breaker-open time to report for a
    /// throttle; callers pass the value computed after the breaker update.
    pub fn user_notice(&self, breaker_wait: Option<Duration>) -> String {
        match self {
            ProviderFailure::Throttled { .. } => {
                let secs = breaker_wait.map(|d| d.as_secs()).unwrap_or(0);
                format!("I'm cooling down, retry in {secs}s.")
            }
            ProviderFailure::QuotaExhausted => {
                "The AI quota is used up. Please contact an admin about billing.".to_string()
            }
            ProviderFailure::AuthInvalid => {
                "The AI is misconfigured. Please contact an admin.".to_string()
            }
            ProviderFailure::Transient(_) => "Something went wrong, try again soon.".to_string(),
        }
    }
}
