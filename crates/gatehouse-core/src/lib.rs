//! Policy core for Gatehouse.
//!
//! Everything with real invariants lives here: the admission pipeline and
//! its gates (breaker, dedupe, cooldown, quota, single-flight), bounded
//! conversation memory, the intake wizard, location resolution, and the
//! chat gateway that orchestrates one inbound event end-to-end.
//!
//! External collaborators (provider, transport sends, role directory, the
//! persisted plan table, web search) are trait seams in [`collaborators`];
//! concrete implementations live in gatehouse-infra.

pub mod admission;
pub mod breaker;
pub mod collaborators;
pub mod ledger;
pub mod location;
pub mod memory;
pub mod plan;
pub mod service;
pub mod wizard;
