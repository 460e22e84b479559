//! Stand-in handoff sink.
//!
//! Completed intake handoffs go to a human-reviewed channel on the chat
//! platform; the adapter that posts there is wired in by the embedding
//! transport process. Without one, delivery fails loudly rather than
//! dropping the record, and the wizard keeps the session so the final
//! step can be retried once a sink is configured.

use tracing::warn;

use gatehouse_core::collaborators::HandoffSink;
use gatehouse_types::error::GatewayError;
use gatehouse_types::wizard::HandoffRecord;

/// `HandoffSink` with no backing channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandoffSink;

impl HandoffSink for NullHandoffSink {
    async fn deliver(&self, record: &HandoffRecord) -> Result<(), GatewayError> {
        warn!(user = %record.user, record_id = %record.id, "no handoff channel configured");
        Err(GatewayError::CollaboratorUnavailable(
            "no handoff channel configured".into(),
        ))
    }
}
