//! Chat gateway: one inbound event, end to end.
//!
//! Resolve the conversation identity once, run admission, and on allow
//! drive the provider call with its history, timeout, failure containment,
//! and reply delivery. The flight permit acquired at admission lives on
//! the stack of `handle_event`, so every exit path releases it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use gatehouse_types::admission::Decision;
use gatehouse_types::config::GatehouseConfig;
use gatehouse_types::event::InboundEvent;
use gatehouse_types::identity::{ConversationKey, LocationId, MessageId};
use gatehouse_types::provider::{ChatTurn, ProviderFailure, TurnRole};

use crate::admission::{Admission, AdmissionController};
use crate::collaborators::{Outbound, PlanStore, RoleDirectory, SearchLookup, TextProvider};
use crate::location::LocationResolver;
use crate::memory::ConversationMemoryStore;
use crate::plan::PlanService;

/// System prompt for education-flavored questions.
const TUTOR_PROMPT: &str = "You are a patient tutor. Explain step by step.";
/// System prompt for everything else.
const DEFAULT_PROMPT: &str = "You are a friendly, concise assistant.";

/// Keywords routing a question to the tutor prompt.
const EDUCATION_KEYWORDS: &[&str] = &[
    "math", "solve", "equation", "algebra", "geometry", "calculus", "science", "physics",
    "chemistry", "biology", "homework", "exam", "test", "question",
];

/// Keywords suggesting the question needs current information.
const WEB_KEYWORDS: &[&str] = &["latest", "today", "current", "news", "update"];

pub(crate) fn is_education(text: &str) -> bool {
    let lower = text.to_lowercase();
    EDUCATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub(crate) fn needs_web(text: &str) -> bool {
    let lower = text.to_lowercase();
    WEB_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// What became of one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Provider replied and the reply was posted.
    Replied {
        location: LocationId,
        message: MessageId,
    },
    /// Admission refused the event.
    Rejected(Decision),
    /// The provider call failed; a notice was posted instead.
    ProviderFailed,
    /// Provider replied but the outbound post failed.
    SendFailed,
}

/// Orchestrates admission, memory, the provider call, and delivery.
pub struct ChatGateway<P, O, L, S, R>
where
    P: TextProvider,
    O: Outbound,
    L: SearchLookup,
    S: PlanStore,
    R: RoleDirectory,
{
    controller: Arc<AdmissionController>,
    memory: Arc<ConversationMemoryStore>,
    resolver: Arc<LocationResolver>,
    plans: Arc<PlanService<S, R>>,
    provider: P,
    outbound: O,
    search: Option<L>,
    provider_timeout: Duration,
    search_timeout: Duration,
    max_sources: usize,
}

impl<P, O, L, S, R> ChatGateway<P, O, L, S, R>
where
    P: TextProvider,
    O: Outbound,
    L: SearchLookup,
    S: PlanStore,
    R: RoleDirectory,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &GatehouseConfig,
        controller: Arc<AdmissionController>,
        memory: Arc<ConversationMemoryStore>,
        resolver: Arc<LocationResolver>,
        plans: Arc<PlanService<S, R>>,
        provider: P,
        outbound: O,
        search: Option<L>,
    ) -> Self {
        Self {
            controller,
            memory,
            resolver,
            plans,
            provider,
            outbound,
            search,
            provider_timeout: Duration::from_secs(config.provider.timeout_secs),
            search_timeout: Duration::from_secs(config.provider.search_timeout_secs),
            max_sources: config.provider.max_sources,
        }
    }

    /// Handle one inbound event. Never panics the caller; all failures
    /// collapse to a disposition plus, where appropriate, a user notice.
    pub async fn handle_event(&self, event: &InboundEvent) -> Disposition {
        // Resolved once; reused for admission, memory, and quota alike.
        let location = self.resolver.resolve(event);
        let key = ConversationKey::new(event.user, location);

        let tier = self.plans.tier_for(event.user).await;
        let permit = match self.controller.admit(event.id, event.user, tier).await {
            Admission::Granted(permit) => permit,
            Admission::Refused(decision) => {
                if let Some(notice) = decision.user_notice() {
                    self.post(location, &notice).await;
                }
                return Disposition::Rejected(decision);
            }
        };

        let mut turns = self.memory.read(key);
        turns.push(ChatTurn::user(&event.text));
        let system = if is_education(&event.text) {
            TUTOR_PROMPT
        } else {
            DEFAULT_PROMPT
        };

        let outcome = match tokio::time::timeout(
            self.provider_timeout,
            self.provider.complete(system, &turns, &event.attachments),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderFailure::Transient("provider call timed out".into())),
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(failure) => {
                self.controller.breaker().record_failure(&failure);
                let notice = failure.user_notice(self.controller.breaker().remaining());
                warn!(event = %event.id, error = %failure, "provider call failed");
                self.post(location, &notice).await;
                drop(permit);
                return Disposition::ProviderFailed;
            }
        };

        let text = self.enrich_with_sources(event, reply.content.clone()).await;

        self.memory.append(key, TurnRole::User, &event.text);
        self.memory.append(key, TurnRole::Assistant, &reply.content);

        let disposition = match self.outbound.send(location, &text).await {
            Ok(message) => {
                // Follow-up replies to this output route back here.
                self.resolver.record_output(message, location);
                debug!(event = %event.id, %location, "reply posted");
                Disposition::Replied { location, message }
            }
            Err(err) => {
                warn!(event = %event.id, error = %err, "outbound send failed");
                Disposition::SendFailed
            }
        };
        drop(permit);
        disposition
    }

    /// Append up to `max_sources` links when the question wants the web.
    ///
    /// Lookup failure or timeout degrades to the bare reply.
    async fn enrich_with_sources(&self, event: &InboundEvent, reply: String) -> String {
        let Some(search) = &self.search else {
            return reply;
        };
        if !event.force_web && !needs_web(&event.text) {
            return reply;
        }

        let links = match tokio::time::timeout(
            self.search_timeout,
            search.top_links(&event.text, self.max_sources),
        )
        .await
        {
            Ok(Ok(links)) => links,
            Ok(Err(err)) => {
                warn!(event = %event.id, error = %err, "search lookup failed");
                return reply;
            }
            Err(_) => {
                warn!(event = %event.id, "search lookup timed out");
                return reply;
            }
        };

        if links.is_empty() {
            return reply;
        }
        let mut out = reply;
        out.push_str("\n\nSources:\n");
        out.push_str(&links[..links.len().min(self.max_sources)].join("\n"));
        out
    }

    async fn post(&self, location: LocationId, text: &str) {
        if let Err(err) = self.outbound.send(location, text).await {
            warn!(%location, error = %err, "notice send failed");
        } else {
            info!(%location, "notice posted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use gatehouse_types::error::{GatewayError, PlanStoreError};
    use gatehouse_types::event::{Attachment, ChannelKind, EventContext};
    use gatehouse_types::identity::{EventId, UserId};
    use gatehouse_types::provider::ProviderReply;
    use gatehouse_types::tier::Tier;

    use crate::breaker::CircuitBreaker;

    #[derive(Default)]
    struct FakeProvider {
        replies: Mutex<Vec<Result<ProviderReply, ProviderFailure>>>,
        hang: Mutex<bool>,
    }

    impl FakeProvider {
        fn push_ok(&self, content: &str) {
            self.replies.lock().unwrap().push(Ok(ProviderReply {
                content: content.to_string(),
            }));
        }

        fn push_err(&self, failure: ProviderFailure) {
            self.replies.lock().unwrap().push(Err(failure));
        }
    }

    impl TextProvider for &FakeProvider {
        async fn complete(
            &self,
            _system: &str,
            _turns: &[ChatTurn],
            _attachments: &[Attachment],
        ) -> Result<ProviderReply, ProviderFailure> {
            if *self.hang.lock().unwrap() {
                std::future::pending::<()>().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Ok(ProviderReply {
                    content: "ok".into(),
                }))
        }
    }

    #[derive(Default)]
    struct FakeOutbound {
        sent: Mutex<Vec<(LocationId, String)>>,
        next_id: Mutex<u64>,
    }

    impl FakeOutbound {
        fn messages(&self) -> Vec<(LocationId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Outbound for &FakeOutbound {
        async fn send(&self, location: LocationId, text: &str) -> Result<MessageId, GatewayError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            self.sent.lock().unwrap().push((location, text.to_string()));
            Ok(MessageId(*next))
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        links: Mutex<Vec<String>>,
        fail: Mutex<bool>,
    }

    impl SearchLookup for &FakeSearch {
        async fn top_links(&self, _query: &str, limit: usize) -> Result<Vec<String>, GatewayError> {
            if *self.fail.lock().unwrap() {
                return Err(GatewayError::CollaboratorUnavailable("search down".into()));
            }
            let links = self.links.lock().unwrap().clone();
            Ok(links.into_iter().take(limit).collect())
        }
    }

    struct NoStore;

    impl PlanStore for NoStore {
        async fn get(&self, _user: UserId) -> Result<Option<Tier>, PlanStoreError> {
            Ok(None)
        }

        async fn put(&self, _user: UserId, _tier: Tier) -> Result<(), PlanStoreError> {
            Ok(())
        }
    }

    struct AllPro;

    impl RoleDirectory for AllPro {
        async fn member_tier(&self, _user: UserId) -> Result<Option<Tier>, GatewayError> {
            Ok(Some(Tier::Pro))
        }

        async fn grant_tier_role(&self, _user: UserId, _tier: Tier) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    struct Harness<'a> {
        gateway: ChatGateway<&'a FakeProvider, &'a FakeOutbound, &'a FakeSearch, NoStore, AllPro>,
    }

    fn harness<'a>(
        provider: &'a FakeProvider,
        outbound: &'a FakeOutbound,
        search: Option<&'a FakeSearch>,
        configure: impl FnOnce(&mut GatehouseConfig),
    ) -> Harness<'a> {
        let mut config = GatehouseConfig::default();
        config.location.home_channel = 777;
        configure(&mut config);

        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(
            config.breaker.default_block_secs,
        )));
        let controller = Arc::new(AdmissionController::new(&config, breaker));
        let memory = Arc::new(ConversationMemoryStore::new(&config.memory));
        let resolver = Arc::new(LocationResolver::new(&config.location));
        let plans = Arc::new(PlanService::new(NoStore, AllPro));

        Harness {
            gateway: ChatGateway::new(
                &config, controller, memory, resolver, plans, provider, outbound, search,
            ),
        }
    }

    fn direct_event(id: u64, user: u64, text: &str) -> InboundEvent {
        InboundEvent {
            id: EventId(id),
            user: UserId(user),
            text: text.to_string(),
            attachments: Vec::new(),
            force_web: false,
            context: EventContext {
                kind: ChannelKind::Direct,
                channel: 100 + user,
                replied_to: None,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn allowed_event_gets_a_reply_and_memory() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        provider.push_ok("four");

        let h = harness(&provider, &outbound, None, |_| {});
        let event = direct_event(1, 1, "what is two plus two");

        let disposition = h.gateway.handle_event(&event).await;
        let Disposition::Replied { location, .. } = disposition else {
            panic!("expected reply, got {disposition:?}");
        };
        assert_eq!(location, LocationId(101));
        assert_eq!(outbound.messages(), vec![(LocationId(101), "four".into())]);

        // History now holds the pair and feeds the next call.
        let key = ConversationKey::new(UserId(1), LocationId(101));
        let turns = h.gateway.memory.read(key);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "four");
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_opens_breaker_and_posts_cooldown_notice() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        provider.push_err(ProviderFailure::Throttled {
            retry_after: Some(Duration::from_secs(45)),
            message: String::new(),
        });

        let h = harness(&provider, &outbound, None, |_| {});
        let disposition = h.gateway.handle_event(&direct_event(1, 1, "hi")).await;
        assert_eq!(disposition, Disposition::ProviderFailed);

        let messages = outbound.messages();
        assert!(messages[0].1.contains("cooling down"));

        // Everyone is now gated behind the breaker.
        let next = h.gateway.handle_event(&direct_event(2, 2, "hi")).await;
        assert!(matches!(
            next,
            Disposition::Rejected(Decision::RejectBreakerOpen { .. })
        ));

        // ...until it closes.
        tokio::time::advance(Duration::from_secs(46)).await;
        provider.push_ok("back");
        let after = h.gateway.handle_event(&direct_event(3, 3, "hi")).await;
        assert!(matches!(after, Disposition::Replied { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_posts_admin_notice_without_opening_breaker() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        provider.push_err(ProviderFailure::AuthInvalid);

        let h = harness(&provider, &outbound, None, |_| {});
        h.gateway.handle_event(&direct_event(1, 1, "hi")).await;
        assert!(outbound.messages()[0].1.contains("admin"));

        provider.push_ok("fine");
        let next = h.gateway.handle_event(&direct_event(2, 2, "hi")).await;
        assert!(matches!(next, Disposition::Replied { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn provider_timeout_is_contained_and_releases_the_permit() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        *provider.hang.lock().unwrap() = true;

        let h = harness(&provider, &outbound, None, |c| c.provider.timeout_secs = 5);
        let disposition = h.gateway.handle_event(&direct_event(1, 1, "hi")).await;
        assert_eq!(disposition, Disposition::ProviderFailed);
        assert!(outbound.messages()[0].1.contains("try again"));

        // The permit was released; the next event is admitted.
        *provider.hang.lock().unwrap() = false;
        provider.push_ok("recovered");
        let next = h.gateway.handle_event(&direct_event(2, 2, "hi")).await;
        assert!(matches!(next, Disposition::Replied { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_event_is_dropped_silently() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        provider.push_ok("a");

        let h = harness(&provider, &outbound, None, |_| {});
        let event = direct_event(9, 1, "hi");
        h.gateway.handle_event(&event).await;

        let second = h.gateway.handle_event(&event).await;
        assert_eq!(second, Disposition::Rejected(Decision::RejectDuplicate));
        // No notice posted for a duplicate.
        assert_eq!(outbound.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn web_question_gets_sources_appended() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        let search = FakeSearch::default();
        provider.push_ok("summary");
        *search.links.lock().unwrap() = vec![
            "https://a.example".into(),
            "https://b.example".into(),
            "https://c.example".into(),
            "https://d.example".into(),
        ];

        let h = harness(&provider, &outbound, Some(&search), |_| {});
        h.gateway
            .handle_event(&direct_event(1, 1, "latest exam schedule"))
            .await;

        let text = &outbound.messages()[0].1;
        assert!(text.starts_with("summary"));
        assert!(text.contains("Sources:"));
        assert!(text.contains("https://c.example"));
        assert!(!text.contains("https://d.example"));
    }

    #[tokio::test(start_paused = true)]
    async fn search_failure_degrades_to_bare_reply() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        let search = FakeSearch::default();
        provider.push_ok("summary");
        *search.fail.lock().unwrap() = true;

        let h = harness(&provider, &outbound, Some(&search), |_| {});
        h.gateway
            .handle_event(&direct_event(1, 1, "today's news"))
            .await;

        assert_eq!(outbound.messages()[0].1, "summary");
    }

    #[tokio::test(start_paused = true)]
    async fn reply_in_shared_channel_routes_back_to_recorded_location() {
        let provider = FakeProvider::default();
        let outbound = FakeOutbound::default();
        provider.push_ok("first answer");
        provider.push_ok("second answer");

        let h = harness(&provider, &outbound, None, |_| {});

        // First exchange happens in a direct channel.
        let first = direct_event(1, 1, "hi");
        let Disposition::Replied { message, .. } = h.gateway.handle_event(&first).await else {
            panic!("expected reply");
        };

        // A follow-up arrives in a shared channel as a reply to our output.
        let follow_up = InboundEvent {
            id: EventId(2),
            user: UserId(1),
            text: "and more".into(),
            attachments: Vec::new(),
            force_web: false,
            context: EventContext {
                kind: ChannelKind::Shared,
                channel: 999,
                replied_to: Some(message),
            },
        };
        let Disposition::Replied { location, .. } = h.gateway.handle_event(&follow_up).await
        else {
            panic!("expected reply");
        };
        assert_eq!(location, LocationId(101));

        // Both exchanges share one memory bucket.
        let key = ConversationKey::new(UserId(1), LocationId(101));
        assert_eq!(h.gateway.memory.read(key).len(), 4);
    }

    #[test]
    fn education_and_web_classifiers() {
        assert!(is_education("help me solve this equation"));
        assert!(is_education("Chemistry homework"));
        assert!(!is_education("tell me a joke"));

        assert!(needs_web("what's the latest score"));
        assert!(needs_web("news from TODAY"));
        assert!(!needs_web("what is two plus two"));
    }
}
