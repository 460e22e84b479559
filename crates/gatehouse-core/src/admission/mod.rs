//! The admission pipeline and its gates.

pub mod controller;
pub mod cooldown;
pub mod dedupe;
pub mod single_flight;

pub use controller::{Admission, AdmissionController};
pub use single_flight::FlightPermit;
