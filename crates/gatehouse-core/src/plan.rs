//! Tier assignment: override table first, role membership second.
//!
//! Overrides come from a small externally persisted table (read through
//! the `PlanStore` seam); role membership is a live lookup against the
//! platform. Results are cached per user for the process lifetime and
//! invalidated on admin writes.

use dashmap::DashMap;
use tracing::{info, warn};

use gatehouse_types::error::GatewayError;
use gatehouse_types::identity::UserId;
use gatehouse_types::tier::Tier;

use crate::collaborators::{PlanStore, RoleDirectory};

/// Resolves and mutates user tiers.
pub struct PlanService<S: PlanStore, R: RoleDirectory> {
    store: S,
    directory: R,
    cache: DashMap<UserId, Tier>,
}

impl<S: PlanStore, R: RoleDirectory> PlanService<S, R> {
    pub fn new(store: S, directory: R) -> Self {
        Self {
            store,
            directory,
            cache: DashMap::new(),
        }
    }

    /// Effective tier for a user.
    ///
    /// Lookup failures degrade to `Free` rather than blocking admission.
    pub async fn tier_for(&self, user: UserId) -> Tier {
        if let Some(tier) = self.cache.get(&user) {
            return *tier;
        }

        let tier = match self.store.get(user).await {
            Ok(Some(tier)) => tier,
            Ok(None) => match self.directory.member_tier(user).await {
                Ok(Some(tier)) => tier,
                Ok(None) => Tier::Free,
                Err(err) => {
                    warn!(%user, error = %err, "role lookup failed, defaulting to free");
                    return Tier::Free; // transient: do not cache
                }
            },
            Err(err) => {
                warn!(%user, error = %err, "plan store read failed, defaulting to free");
                return Tier::Free; // transient: do not cache
            }
        };

        self.cache.insert(user, tier);
        tier
    }

    /// Admin override: persist the tier, update the cache, sync the role.
    pub async fn set_tier(&self, user: UserId, tier: Tier) -> Result<(), GatewayError> {
        self.store
            .put(user, tier)
            .await
            .map_err(|err| GatewayError::Store(err.to_string()))?;
        self.cache.insert(user, tier);

        // Role sync is best-effort; the override table is authoritative.
        if let Err(err) = self.directory.grant_tier_role(user, tier).await {
            warn!(%user, %tier, error = %err, "tier role sync failed");
        }

        info!(%user, %tier, "tier override set");
        Ok(())
    }

    /// Drop the cached tier so the next lookup re-resolves.
    pub fn invalidate(&self, user: UserId) {
        self.cache.remove(&user);
    }
}
