//! Subscription tiers controlling quota and cooldown exemptions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription level of a user.
///
/// Ordering is meaningful: `Free < Plus < Pro`. Pro users skip the
/// per-message cooldown and have no hourly quota.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Plus,
    Pro,
}

impl Tier {
    /// Whether this tier is exempt from the per-message cooldown.
    pub fn skips_cooldown(&self) -> bool {
        matches!(self, Tier::Pro)
    }

    /// Whether this tier has an hourly request quota at all.
    pub fn is_metered(&self) -> bool {
        !matches!(self, Tier::Pro)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Plus => write!(f, "plus"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "plus" => Ok(Tier::Plus),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("invalid tier: '{other}'")),
        }
    }
}
