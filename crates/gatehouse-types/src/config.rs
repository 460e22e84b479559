//! Gatehouse configuration.
//!
//! `GatehouseConfig` is the top-level `gatehouse.toml`. Every field has a
//! default so an empty (or missing) file yields a working configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Gatehouse policy layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatehouseConfig {
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

/// Admission gate tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Per-user cooldown between admitted events, in seconds. Pro skips it.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How long an event id stays in the dedupe registry, in seconds.
    #[serde(default = "default_dedupe_ttl_secs")]
    pub dedupe_ttl_secs: u64,

    /// When true, Pro admits queue for the single-flight permit instead of
    /// being rejected with busy. The one-call-in-flight cap still holds.
    #[serde(default)]
    pub pro_bypasses_busy: bool,
}

fn default_cooldown_secs() -> u64 {
    15
}

fn default_dedupe_ttl_secs() -> u64 {
    600
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            dedupe_ttl_secs: default_dedupe_ttl_secs(),
            pro_bypasses_busy: false,
        }
    }
}

/// Rolling-window quota limits per tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_free_per_window")]
    pub free_per_window: u32,

    #[serde(default = "default_plus_per_window")]
    pub plus_per_window: u32,

    /// Window length in seconds. The window opens on first use.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_free_per_window() -> u32 {
    2
}

fn default_plus_per_window() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    3600
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_per_window: default_free_per_window(),
            plus_per_window: default_plus_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Block duration when a throttle carries no usable retry delay.
    #[serde(default = "default_block_secs")]
    pub default_block_secs: u64,
}

fn default_block_secs() -> u64 {
    180
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            default_block_secs: default_block_secs(),
        }
    }
}

/// Conversation memory retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Idle time after which a conversation's memory is dropped, in seconds.
    #[serde(default = "default_memory_ttl_secs")]
    pub ttl_secs: u64,

    /// Number of most-recent turn-pairs kept per conversation.
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
}

fn default_memory_ttl_secs() -> u64 {
    1800
}

fn default_max_pairs() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_memory_ttl_secs(),
            max_pairs: default_max_pairs(),
        }
    }
}

/// Provider call bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Hard timeout on the provider call itself, in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the ancillary web-search lookup, in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Maximum source links appended to a reply.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

fn default_provider_timeout_secs() -> u64 {
    60
}

fn default_search_timeout_secs() -> u64 {
    10
}

fn default_max_sources() -> usize {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout_secs(),
            search_timeout_secs: default_search_timeout_secs(),
            max_sources: default_max_sources(),
        }
    }
}

/// Location resolution defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Identity assigned to events from ambient shared channels.
    #[serde(default)]
    pub home_channel: u64,

    /// How long a recorded output stays in the reply index, in seconds.
    #[serde(default = "default_reply_index_ttl_secs")]
    pub reply_index_ttl_secs: u64,
}

fn default_reply_index_ttl_secs() -> u64 {
    3600
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            home_channel: 0,
            reply_index_ttl_secs: default_reply_index_ttl_secs(),
        }
    }
}
