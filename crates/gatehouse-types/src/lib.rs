//! Shared domain types for the Gatehouse admission layer.

pub mod admission;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod provider;
pub mod tier;
pub mod wizard;
