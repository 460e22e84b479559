//! Inbound chat events as delivered by the transport layer.
//!
//! The transport hands Gatehouse one `InboundEvent` per user message. The
//! event carries raw location hints; `LocationResolver` in gatehouse-core
//! turns them into a canonical `LocationId` exactly once per event.

use serde::{Deserialize, Serialize};

use crate::identity::{EventId, MessageId, UserId};

/// The kind of channel an event arrived in, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelKind {
    /// Private one-to-one conversation with the bot.
    Direct,
    /// A per-user sub-context spawned for ongoing assistance.
    AssistThread { owner: UserId },
    /// Any ambient shared channel.
    Shared,
}

/// Raw location hints attached to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Kind of the channel the event was posted in.
    pub kind: ChannelKind,
    /// Transport-level id of that channel.
    pub channel: u64,
    /// Message this event replies to, if any.
    pub replied_to: Option<MessageId>,
}

/// A file or image attached to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    /// MIME type as reported by the transport, when known.
    pub content_type: Option<String>,
}

impl Attachment {
    /// Whether this attachment is an image the provider can consume.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// One inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: EventId,
    pub user: UserId,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Set when the user used the explicit force-web command form.
    #[serde(default)]
    pub force_web: bool,
    pub context: EventContext,
}
