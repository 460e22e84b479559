//! CLI definition and command implementations.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gatehouse_types::identity::UserId;
use gatehouse_types::tier::Tier;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "gatehouse", about = "Admission policy layer for chat events")]
pub struct Cli {
    /// Path to gatehouse.toml (defaults to {data_dir}/gatehouse.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the admin HTTP surface.
    Serve {
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:8750")]
        addr: SocketAddr,

        /// Enable OpenTelemetry span export.
        #[arg(long)]
        otel: bool,
    },

    /// Inspect or override user tiers.
    Tier {
        #[command(subcommand)]
        action: TierAction,
    },

    /// Circuit breaker administration.
    Breaker {
        #[command(subcommand)]
        action: BreakerAction,
    },

    /// Show a user's rolling-window usage.
    Usage { user: u64 },
}

#[derive(Debug, Subcommand)]
pub enum BreakerAction {
    /// Close the breaker immediately.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum TierAction {
    /// Persist a tier override for a user.
    Set { user: u64, tier: Tier },
    /// Show the effective tier for a user.
    Get { user: u64 },
}

pub async fn tier_set(state: &AppState, user: u64, tier: Tier) -> anyhow::Result<()> {
    state.plans.set_tier(UserId(user), tier).await?;
    println!("user {user} -> {tier}");
    Ok(())
}

pub async fn tier_get(state: &AppState, user: u64) -> anyhow::Result<()> {
    let tier = state.plans.tier_for(UserId(user)).await;
    println!("user {user}: {tier}");
    Ok(())
}

pub fn breaker_clear(state: &AppState) {
    state.breaker.clear();
    println!("breaker cleared");
}

pub async fn usage(state: &AppState, user: u64) -> anyhow::Result<()> {
    let tier = state.plans.tier_for(UserId(user)).await;
    let status = state.controller.usage_status(UserId(user), tier);
    match status.limit {
        Some(limit) => {
            let reset = status
                .resets_in
                .map(|d| format!(", resets in {}s", d.as_secs()))
                .unwrap_or_default();
            println!("user {user} ({tier}): {}/{limit} used{reset}", status.used);
        }
        None => println!("user {user} ({tier}): unmetered"),
    }
    Ok(())
}
