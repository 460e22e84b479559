//! Gatehouse CLI and admin HTTP entry point.
//!
//! Parses CLI arguments, loads configuration, wires the admission state,
//! then dispatches to a command or starts the admin server.

mod cli;
mod http;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gatehouse_infra::resolve_data_dir;
use gatehouse_types::config::GatehouseConfig;

use cli::{BreakerAction, Cli, Commands, TierAction};
use state::AppState;

/// Load `gatehouse.toml`, falling back to defaults when the file is absent.
async fn load_config(path: Option<PathBuf>) -> anyhow::Result<GatehouseConfig> {
    let path = path.unwrap_or_else(|| resolve_data_dir().join("gatehouse.toml"));
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("invalid config at {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(GatehouseConfig::default())
        }
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info,gatehouse=debug",
        _ => "trace",
    };
    let otel = matches!(&cli.command, Commands::Serve { otel: true, .. });
    gatehouse_observe::tracing_setup::init_tracing(default_filter, otel)
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let config = load_config(cli.config).await?;
    let state = AppState::init(config).await?;

    match cli.command {
        Commands::Serve { addr, .. } => {
            let router = http::router::build_router(state);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(%addr, "admin surface listening");
            axum::serve(listener, router).await?;
        }

        Commands::Tier { action } => match action {
            TierAction::Set { user, tier } => cli::tier_set(&state, user, tier).await?,
            TierAction::Get { user } => cli::tier_get(&state, user).await?,
        },

        Commands::Breaker { action } => match action {
            BreakerAction::Clear => cli::breaker_clear(&state),
        },

        Commands::Usage { user } => cli::usage(&state, user).await?,
    }

    gatehouse_observe::tracing_setup::shutdown_tracing();
    Ok(())
}
