//! Observability wiring for Gatehouse.

pub mod tracing_setup;
