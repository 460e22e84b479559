//! The admit/reject decision for one inbound event.
//!
//! Gates run cheapest and most global first: breaker, dedupe, cooldown,
//! quota, single-flight. Nothing is consumed until every gate has passed;
//! the side effects (dedupe mark, quota unit, cooldown stamp) are applied
//! together with the permit acquisition, with no suspension point in
//! between on the default path.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use gatehouse_types::admission::{Decision, UsageStatus};
use gatehouse_types::config::GatehouseConfig;
use gatehouse_types::identity::{EventId, UserId};
use gatehouse_types::tier::Tier;

use crate::admission::cooldown::CooldownTracker;
use crate::admission::dedupe::DedupeRegistry;
use crate::admission::single_flight::{FlightPermit, SingleFlight};
use crate::breaker::CircuitBreaker;
use crate::ledger::UsageLedger;

/// Outcome of the admission pipeline, carrying the flight permit on allow.
#[derive(Debug)]
pub enum Admission {
    Granted(FlightPermit),
    Refused(Decision),
}

impl Admission {
    /// The plain decision, with the permit erased.
    pub fn decision(&self) -> Decision {
        match self {
            Admission::Granted(_) => Decision::Allow,
            Admission::Refused(decision) => decision.clone(),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted(_))
    }
}

/// Orchestrates breaker, dedupe, cooldown, quota, and single-flight into
/// one admit/reject decision per event.
pub struct AdmissionController {
    breaker: Arc<CircuitBreaker>,
    ledger: Arc<UsageLedger>,
    dedupe: DedupeRegistry,
    cooldown: CooldownTracker,
    flight: SingleFlight,
    pro_bypasses_busy: bool,
}

impl AdmissionController {
    pub fn new(config: &GatehouseConfig, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            breaker,
            ledger: Arc::new(UsageLedger::new(&config.quota)),
            dedupe: DedupeRegistry::new(Duration::from_secs(config.admission.dedupe_ttl_secs)),
            cooldown: CooldownTracker::new(Duration::from_secs(config.admission.cooldown_secs)),
            flight: SingleFlight::new(),
            pro_bypasses_busy: config.admission.pro_bypasses_busy,
        }
    }

    /// Decide whether a provider call may proceed for this event.
    pub async fn admit(&self, event: EventId, user: UserId, tier: Tier) -> Admission {
        if let Some(retry_in) = self.breaker.remaining() {
            debug!(%event, %user, "rejected: breaker open");
            return Admission::Refused(Decision::RejectBreakerOpen { retry_in });
        }

        if self.dedupe.seen(event) {
            debug!(%event, %user, "rejected: duplicate event id");
            return Admission::Refused(Decision::RejectDuplicate);
        }

        if !tier.skips_cooldown()
            && let Some(retry_in) = self.cooldown.remaining(user)
        {
            debug!(%event, %user, "rejected: cooldown active");
            return Admission::Refused(Decision::RejectCooldown { retry_in });
        }

        let verdict = self.ledger.check(user, tier);
        if !verdict.allowed {
            debug!(%event, %user, "rejected: quota exhausted");
            return Admission::Refused(Decision::RejectQuota {
                retry_in: verdict.resets_in,
            });
        }

        if self.pro_bypasses_busy && tier == Tier::Pro {
            // Queued mode: the event is committed to handling before the
            // wait, so a redelivery arriving mid-wait still deduplicates.
            self.dedupe.mark(event);
            let permit = self.flight.acquire().await;
            self.ledger.consume(user, tier);
            self.cooldown.stamp(user);
            return Admission::Granted(permit);
        }

        let Some(permit) = self.flight.try_acquire() else {
            debug!(%event, %user, "rejected: provider call in flight");
            return Admission::Refused(Decision::RejectBusy);
        };

        self.dedupe.mark(event);
        self.ledger.consume(user, tier);
        self.cooldown.stamp(user);
        debug!(%event, %user, %tier, "admitted");
        Admission::Granted(permit)
    }

    /// Usage snapshot for the admin surface.
    pub fn usage_status(&self, user: UserId, tier: Tier) -> UsageStatus {
        self.ledger.status(user, tier)
    }

    /// The breaker shared with the gateway and admin surface.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}
