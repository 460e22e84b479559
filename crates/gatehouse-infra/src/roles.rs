//! Stand-in role directory.
//!
//! Tier-role membership lives in the chat platform; the adapter that talks
//! to it is wired in by the embedding transport process. This null
//! implementation keeps the admin surface and tests working without one:
//! nobody is a member of anything, and grants are logged and dropped.

use tracing::debug;

use gatehouse_core::collaborators::RoleDirectory;
use gatehouse_types::error::GatewayError;
use gatehouse_types::identity::UserId;
use gatehouse_types::tier::Tier;

/// `RoleDirectory` with no backing platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRoleDirectory;

impl RoleDirectory for NullRoleDirectory {
    async fn member_tier(&self, _user: UserId) -> Result<Option<Tier>, GatewayError> {
        Ok(None)
    }

    async fn grant_tier_role(&self, user: UserId, tier: Tier) -> Result<(), GatewayError> {
        debug!(%user, %tier, "no role directory configured, grant skipped");
        Ok(())
    }
}
