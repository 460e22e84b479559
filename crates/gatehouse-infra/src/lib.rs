//! Infrastructure implementations for Gatehouse.
//!
//! Implements the collaborator seams from `gatehouse-core` that do real
//! I/O: the file-backed tier override table and the web-search client.

pub mod handoff;
pub mod plan_file;
pub mod roles;
pub mod search;

use std::path::PathBuf;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `GATEHOUSE_DATA_DIR` environment variable
/// 2. `~/.gatehouse`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GATEHOUSE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gatehouse");
    }
    PathBuf::from(".gatehouse")
}
