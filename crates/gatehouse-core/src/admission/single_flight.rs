//! Global single-flight guard around the provider call.
//!
//! A one-permit semaphore; the permit rides inside [`FlightPermit`] so it
//! is released when the permit is dropped, on every exit path of the
//! handler that holds it, including panics and early returns.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Permission to run the one in-flight provider call.
#[derive(Debug)]
pub struct FlightPermit {
    _permit: OwnedSemaphorePermit,
}

/// Process-wide cap of one concurrent provider call.
#[derive(Debug, Clone)]
pub struct SingleFlight {
    semaphore: Arc<Semaphore>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the permit if it is free; `None` when a call is in flight.
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| FlightPermit { _permit: permit })
    }

    /// Wait for the permit. Used only for the configured pro bypass.
    pub async fn acquire(&self) -> FlightPermit {
        // The semaphore is never closed while the guard exists.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("single-flight semaphore closed"));
        FlightPermit { _permit: permit }
    }

    /// Whether a provider call is currently in flight.
    pub fn busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}
