//! Trait seams for external collaborators.
//!
//! The core never performs I/O itself. Each seam is an async trait using
//! explicit `impl Future + Send` returns (RPITIT); infra provides the real
//! implementations and tests provide doubles.

use gatehouse_types::error::{GatewayError, PlanStoreError};
use gatehouse_types::event::Attachment;
use gatehouse_types::identity::{LocationId, MessageId, UserId};
use gatehouse_types::provider::{ChatTurn, ProviderFailure, ProviderReply};
use gatehouse_types::tier::Tier;
use gatehouse_types::wizard::HandoffRecord;

/// The generative-text provider.
pub trait TextProvider: Send + Sync {
    /// Run one completion over the given system prompt and turn history.
    fn complete(
        &self,
        system: &str,
        turns: &[ChatTurn],
        attachments: &[Attachment],
    ) -> impl std::future::Future<Output = Result<ProviderReply, ProviderFailure>> + Send;
}

/// Posts text into a location. Returns the id of the posted message so the
/// location resolver can route replies to it later.
pub trait Outbound: Send + Sync {
    fn send(
        &self,
        location: LocationId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<MessageId, GatewayError>> + Send;
}

/// Delivers a completed intake handoff to the administrative channel.
pub trait HandoffSink: Send + Sync {
    fn deliver(
        &self,
        record: &HandoffRecord,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}

/// Role-membership lookup and mutation for tier assignment.
pub trait RoleDirectory: Send + Sync {
    /// Tier implied by the user's role membership, if any.
    fn member_tier(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Tier>, GatewayError>> + Send;

    /// Grant the role matching `tier` (and drop any other tier role).
    fn grant_tier_role(
        &self,
        user: UserId,
        tier: Tier,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}

/// The externally persisted user -> tier override table.
pub trait PlanStore: Send + Sync {
    fn get(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Tier>, PlanStoreError>> + Send;

    fn put(
        &self,
        user: UserId,
        tier: Tier,
    ) -> impl std::future::Future<Output = Result<(), PlanStoreError>> + Send;
}

/// Ancillary web-search lookup used to enrich replies with source links.
pub trait SearchLookup: Send + Sync {
    fn top_links(
        &self,
        query: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, GatewayError>> + Send;
}
