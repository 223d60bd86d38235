// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event orchestration.
//!
//! For each inbound event the engine resolves the page and its owner, checks
//! the quota, then (under the conversation lock) logs the message and picks
//! exactly one path: a keyword-triggered flow, the stored conversation, the
//! page's default flow, or the AI fallback.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use pagebot_ai::{AiDispatcher, AiRequest, KeyRotator, Providers};
use pagebot_config::PagebotConfig;
use pagebot_core::types::{
    Conversation, ConversationKey, FlowRecord, InboundEvent, MessageEntry, Page, PageRef, Role,
    Tenant,
};
use pagebot_core::{ChannelAdapter, OutboundPayload, PagebotError, StorageAdapter};
use pagebot_flow::{FlowGraph, Halt, Interpreter};
use pagebot_quota::{Admission, QuotaGate};
use pagebot_router::KeywordRouter;
use tracing::{debug, error, info, warn};

use crate::effects::FlowEffects;
use crate::locks::ConversationLocks;
use crate::outbox::{Outbox, Recipient};

/// Why an event was dropped before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnknownPage,
    InactivePage,
    MissingOwner,
    QuotaExhausted,
    EmptyText,
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing was logged, sent, or stored.
    Dropped(DropReason),
    /// A flow pass ran.
    Flow {
        flow_id: String,
        position: String,
        halt: Halt,
        /// Payloads delivered by the pass.
        delivered: usize,
        /// The pass made no moves and the AI fallback answered.
        ai_fallback: bool,
    },
    /// A flow was selected but could not be entered.
    FlowAborted { flow_id: String },
    /// Top-level AI fallback answered.
    AiReply { generated: bool },
    /// Nothing matched and AI is disabled for the page.
    NoReply,
    /// A storage failure cut processing short.
    Failed { error: String },
}

/// Everything known about an event once it has been admitted.
struct EventContext<'a> {
    page: &'a Page,
    tenant: &'a Tenant,
    key: ConversationKey,
    text: &'a str,
}

impl EventContext<'_> {
    fn recipient(&self) -> Recipient<'_> {
        Recipient {
            page: self.page,
            tenant: self.tenant,
            user_id: &self.key.user_id,
            channel: self.key.channel,
        }
    }
}

/// The routing and flow-interpretation engine.
pub struct Engine {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    router: KeywordRouter,
    quota: Arc<QuotaGate>,
    interpreter: Interpreter,
    ai: AiDispatcher,
    outbox: Outbox,
    locks: ConversationLocks,
}

impl Engine {
    pub fn new(
        config: &PagebotConfig,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        providers: Providers,
    ) -> Self {
        let quota = Arc::new(QuotaGate::new(config.quota.clone(), storage.clone()));
        let ai = AiDispatcher::new(
            config.ai.clone(),
            config.providers.clone(),
            providers,
            storage.clone(),
        );
        info!(max_flow_steps = config.engine.max_flow_steps, "engine initialized");
        Self {
            outbox: Outbox::new(storage.clone(), quota.clone()),
            storage,
            router: KeywordRouter::new(),
            quota,
            interpreter: Interpreter::new(config.engine.max_flow_steps),
            ai,
            locks: ConversationLocks::new(),
        }
    }

    /// Register the delivery adapter for a channel.
    pub fn with_channel(mut self, adapter: Arc<dyn ChannelAdapter + Send + Sync>) -> Self {
        self.outbox.register(adapter);
        self
    }

    /// Replace the provider key rotator, e.g. with a seeded one.
    pub fn with_key_rotator(mut self, rotator: KeyRotator) -> Self {
        self.ai = self.ai.with_rotator(rotator);
        self
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter + Send + Sync> {
        &self.storage
    }

    /// Handle one inbound event. Never fails; errors are logged and
    /// reported in the outcome.
    pub async fn handle_event(&self, event: InboundEvent) -> EventOutcome {
        match self.process(&event).await {
            Ok(outcome) => {
                debug!(sender_id = event.sender_id.as_str(), ?outcome, "event handled");
                outcome
            }
            Err(e) => {
                error!(
                    sender_id = event.sender_id.as_str(),
                    channel = %event.channel,
                    error = %e,
                    "event handling failed"
                );
                EventOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Handle a batch. Events from different senders run concurrently;
    /// events from one sender run in order. Outcomes follow input order.
    pub async fn handle_batch(&self, events: Vec<InboundEvent>) -> Vec<EventOutcome> {
        let total = events.len();
        let mut groups: HashMap<(PageRef, String), Vec<(usize, InboundEvent)>> = HashMap::new();
        let mut order = Vec::new();
        for (i, event) in events.into_iter().enumerate() {
            let key = (event.page.clone(), event.sender_id.clone());
            let group = groups.entry(key.clone()).or_default();
            if group.is_empty() {
                order.push(key);
            }
            group.push((i, event));
        }

        let runs = order.into_iter().filter_map(|key| groups.remove(&key)).map(|group| async move {
            let mut results = Vec::with_capacity(group.len());
            for (i, event) in group {
                results.push((i, self.handle_event(event).await));
            }
            results
        });

        let mut outcomes: Vec<Option<EventOutcome>> = vec![None; total];
        for (i, outcome) in join_all(runs).await.into_iter().flatten() {
            outcomes[i] = Some(outcome);
        }
        outcomes
            .into_iter()
            .map(|o| {
                o.unwrap_or(EventOutcome::Failed {
                    error: "event was not processed".to_string(),
                })
            })
            .collect()
    }

    async fn process(&self, event: &InboundEvent) -> Result<EventOutcome, PagebotError> {
        let page = match &event.page {
            PageRef::Id(id) => self.storage.get_page(id).await?,
            PageRef::External(id) => self.storage.get_page_by_external_id(id).await?,
        };
        let Some(page) = page else {
            debug!(page = ?event.page, "event for unknown page");
            return Ok(EventOutcome::Dropped(DropReason::UnknownPage));
        };
        if !page.is_active {
            debug!(page_id = page.id.as_str(), "event for inactive page");
            return Ok(EventOutcome::Dropped(DropReason::InactivePage));
        }
        let Some(tenant) = self.storage.get_tenant(&page.owner_id).await? else {
            warn!(page_id = page.id.as_str(), owner_id = page.owner_id.as_str(), "page owner not found");
            return Ok(EventOutcome::Dropped(DropReason::MissingOwner));
        };

        if let Admission::Exhausted { .. } = self.quota.admit(&tenant) {
            return Ok(EventOutcome::Dropped(DropReason::QuotaExhausted));
        }
        if event.text.trim().is_empty() {
            return Ok(EventOutcome::Dropped(DropReason::EmptyText));
        }

        let _guard = self.locks.acquire(&page.id, &event.sender_id).await;
        let ctx = EventContext {
            page: &page,
            tenant: &tenant,
            key: ConversationKey::new(page.id.as_str(), event.sender_id.as_str(), event.channel),
            text: &event.text,
        };

        self.storage
            .append_message(&MessageEntry {
                page_id: page.id.clone(),
                user_id: event.sender_id.clone(),
                role: Role::User,
                content: event.text.clone(),
                channel: event.channel,
            })
            .await?;

        let keywords = self.storage.list_keywords(&page.id).await?;
        if keywords.is_empty() {
            self.router.forget_page(&page.id);
        }
        if let Some(hit) = self.router.route(&keywords, &event.text) {
            info!(
                page_id = page.id.as_str(),
                user_id = event.sender_id.as_str(),
                rule_id = hit.rule_id.as_str(),
                flow_id = hit.flow_id.as_str(),
                "keyword matched, restarting conversation"
            );
            self.storage
                .delete_conversations(&page.id, &event.sender_id)
                .await?;
            return match self.storage.get_flow(&hit.flow_id).await? {
                Some(record) => self.enter_flow(&ctx, &record).await,
                None => {
                    warn!(flow_id = hit.flow_id.as_str(), "keyword targets a missing flow");
                    Ok(EventOutcome::FlowAborted {
                        flow_id: hit.flow_id,
                    })
                }
            };
        }

        if let Some(conversation) = self.storage.get_conversation(&ctx.key).await? {
            if let Some(outcome) = self.resume(&ctx, &conversation).await? {
                return Ok(outcome);
            }
        }

        if let Some(record) = self.storage.find_default_flow(&page.id).await? {
            return self.enter_flow(&ctx, &record).await;
        }

        if page.ai_enabled {
            let generated = self.ai_fallback(&ctx).await;
            return Ok(EventOutcome::AiReply { generated });
        }
        debug!(page_id = page.id.as_str(), "no flow matched and AI is disabled");
        Ok(EventOutcome::NoReply)
    }

    /// Resume a stored conversation. `None` means it was stale and has been
    /// discarded.
    async fn resume(
        &self,
        ctx: &EventContext<'_>,
        conversation: &Conversation,
    ) -> Result<Option<EventOutcome>, PagebotError> {
        let record = self.storage.get_flow(&conversation.flow_id).await?;
        let reason = match (record, conversation.state.as_deref()) {
            (None, _) => "flow no longer exists".to_string(),
            (Some(_), None) => "conversation has no state".to_string(),
            (Some(record), Some(state)) => match FlowGraph::from_record(&record) {
                Ok(graph) if graph.contains(state) => {
                    debug!(
                        flow_id = graph.id(),
                        node_id = state,
                        user_id = ctx.key.user_id.as_str(),
                        "resuming conversation"
                    );
                    return self.run_pass(ctx, &graph, state).await.map(Some);
                }
                Ok(_) => "state node no longer exists".to_string(),
                Err(e) => e.to_string(),
            },
        };

        warn!(
            page_id = ctx.page.id.as_str(),
            user_id = ctx.key.user_id.as_str(),
            flow_id = conversation.flow_id.as_str(),
            reason = reason.as_str(),
            "discarding stale conversation"
        );
        self.storage
            .delete_conversations(&ctx.page.id, &ctx.key.user_id)
            .await?;
        Ok(None)
    }

    /// Enter a flow fresh at its trigger.
    async fn enter_flow(
        &self,
        ctx: &EventContext<'_>,
        record: &FlowRecord,
    ) -> Result<EventOutcome, PagebotError> {
        let aborted = |e: pagebot_flow::FlowError| {
            error!(flow_id = record.id.as_str(), error = %e, "cannot enter flow");
            EventOutcome::FlowAborted {
                flow_id: record.id.clone(),
            }
        };
        let graph = match FlowGraph::from_record(record) {
            Ok(graph) => graph,
            Err(e) => return Ok(aborted(e)),
        };
        let trigger = match graph.trigger() {
            Ok(node) => node.id.clone(),
            Err(e) => return Ok(aborted(e)),
        };

        self.storage
            .start_conversation(&ctx.key, graph.id(), Some(&trigger))
            .await?;
        info!(
            page_id = ctx.page.id.as_str(),
            user_id = ctx.key.user_id.as_str(),
            flow_id = graph.id(),
            "entering flow"
        );
        self.run_pass(ctx, &graph, &trigger).await
    }

    /// One interpreter pass from `start`, then persist the reached node.
    async fn run_pass(
        &self,
        ctx: &EventContext<'_>,
        graph: &FlowGraph,
        start: &str,
    ) -> Result<EventOutcome, PagebotError> {
        let mut effects = FlowEffects {
            outbox: &self.outbox,
            storage: self.storage.as_ref(),
            ai: &self.ai,
            to: ctx.recipient(),
            delivered: 0,
        };
        let pass = self
            .interpreter
            .run_pass(graph, start, ctx.text, &mut effects)
            .await;
        let delivered = effects.delivered;

        let persisted = self
            .storage
            .update_conversation_state_if(&ctx.key, Some(start), Some(&pass.position))
            .await?;
        if !persisted {
            warn!(
                flow_id = graph.id(),
                user_id = ctx.key.user_id.as_str(),
                "conversation changed during pass, state not saved"
            );
        }

        let ai_fallback = pass.steps == 0 && ctx.page.ai_enabled;
        if ai_fallback {
            debug!(flow_id = graph.id(), node_id = start, "flow exhausted, using AI fallback");
            self.ai_fallback(ctx).await;
        }

        Ok(EventOutcome::Flow {
            flow_id: graph.id().to_string(),
            position: pass.position,
            halt: pass.halt,
            delivered,
            ai_fallback,
        })
    }

    /// Top-level AI reply. Returns whether the provider produced it.
    async fn ai_fallback(&self, ctx: &EventContext<'_>) -> bool {
        let reply = self
            .ai
            .reply(AiRequest {
                page: ctx.page,
                user_id: &ctx.key.user_id,
                text: ctx.text,
                overrides: None,
            })
            .await;
        let generated = reply.generated;
        self.outbox
            .deliver(
                ctx.recipient(),
                OutboundPayload::Text { text: reply.text },
                generated,
            )
            .await;
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebot_core::Channel;
    use pagebot_core::types::MatchType;
    use pagebot_test_utils::{MockChannel, MockProvider, TestHarness};
    use serde_json::{Value, json};
    use tracing_test::traced_test;

    struct Fixture {
        harness: TestHarness,
        gemini: Arc<MockProvider>,
        channel: Arc<MockChannel>,
        engine: Engine,
    }

    impl Fixture {
        async fn new() -> Self {
            let harness = TestHarness::new().await;
            let mut config = harness.config();
            config.providers.gemini.api_key = Some("g-default".into());
            let gemini = Arc::new(MockProvider::named("gemini"));
            let channel = Arc::new(MockChannel::new(Channel::Messenger));
            let engine = Engine::new(
                &config,
                harness.storage(),
                Providers {
                    openai: Arc::new(MockProvider::named("openai")),
                    anthropic: Arc::new(MockProvider::named("anthropic")),
                    gemini: gemini.clone(),
                },
            )
            .with_channel(channel.clone());
            harness.insert_page(&TestHarness::page("p1", "t1")).await;
            Self {
                harness,
                gemini,
                channel,
                engine,
            }
        }
    }

    fn event(user: &str, text: &str) -> InboundEvent {
        InboundEvent {
            channel: Channel::Messenger,
            page: PageRef::External("ext-p1".into()),
            sender_id: user.into(),
            text: text.into(),
        }
    }

    fn greeting_flow() -> (Value, Value) {
        (
            json!([
                {"id": "t", "type": "trigger", "data": {}},
                {"id": "hi", "type": "message", "data": {"label": "Hi"}},
                {"id": "ask", "type": "input", "data": {"label": "Name?"}},
                {"id": "thanks", "type": "message", "data": {"label": "Thanks"}}
            ]),
            json!([
                {"id": "e1", "source": "t", "target": "hi"},
                {"id": "e2", "source": "hi", "target": "ask"},
                {"id": "e3", "source": "ask", "target": "thanks"}
            ]),
        )
    }

    #[tokio::test]
    async fn unknown_and_inactive_pages_are_dropped() {
        let fx = Fixture::new().await;
        let mut ghost = event("u1", "hello");
        ghost.page = PageRef::External("nope".into());
        assert_eq!(
            fx.engine.handle_event(ghost).await,
            EventOutcome::Dropped(DropReason::UnknownPage)
        );

        let mut page = TestHarness::page("p2", "t1");
        page.is_active = false;
        fx.harness.insert_page(&page).await;
        let mut inactive = event("u1", "hello");
        inactive.page = PageRef::Id("p2".into());
        assert_eq!(
            fx.engine.handle_event(inactive).await,
            EventOutcome::Dropped(DropReason::InactivePage)
        );
        assert_eq!(fx.channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn blank_text_is_dropped_without_logging() {
        let fx = Fixture::new().await;
        assert_eq!(
            fx.engine.handle_event(event("u1", "   ")).await,
            EventOutcome::Dropped(DropReason::EmptyText)
        );
        let log = fx.harness.storage().recent_messages("p1", "u1", 10).await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn keyword_to_missing_flow_aborts_after_reset() {
        let fx = Fixture::new().await;
        let (nodes, edges) = greeting_flow();
        fx.harness.insert_flow("p1", "f1", nodes, edges, true).await;
        fx.harness
            .insert_keyword("k1", "p1", "reset", MatchType::Exact, "gone")
            .await;

        fx.engine.handle_event(event("u1", "hello")).await;
        let outcome = fx.engine.handle_event(event("u1", "RESET")).await;

        assert_eq!(
            outcome,
            EventOutcome::FlowAborted {
                flow_id: "gone".into()
            }
        );
        let key = ConversationKey::new("p1", "u1", Channel::Messenger);
        assert!(fx.harness.storage().get_conversation(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn stale_state_restarts_in_default_flow() {
        let fx = Fixture::new().await;
        let (nodes, edges) = greeting_flow();
        fx.harness.insert_flow("p1", "f1", nodes, edges, true).await;
        let key = ConversationKey::new("p1", "u1", Channel::Messenger);
        fx.harness
            .storage()
            .start_conversation(&key, "f1", Some("deleted-node"))
            .await
            .unwrap();

        let outcome = fx.engine.handle_event(event("u1", "hello")).await;

        match outcome {
            EventOutcome::Flow { flow_id, position, halt, delivered, .. } => {
                assert_eq!(flow_id, "f1");
                assert_eq!(position, "ask");
                assert_eq!(halt, Halt::Waiting);
                assert_eq!(delivered, 2);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(fx.channel.sent_texts(), ["Hi", "Name?"]);
        assert!(logs_contain("discarding stale conversation"));
    }

    #[tokio::test]
    async fn exhausted_pass_hands_over_to_ai() {
        let fx = Fixture::new().await;
        let (nodes, edges) = greeting_flow();
        fx.harness.insert_flow("p1", "f1", nodes, edges, true).await;
        fx.gemini.push_reply("Happy to help");

        fx.engine.handle_event(event("u1", "hello")).await;
        fx.engine.handle_event(event("u1", "Ada")).await;
        let outcome = fx.engine.handle_event(event("u1", "anything else?")).await;

        match outcome {
            EventOutcome::Flow { position, ai_fallback, delivered, .. } => {
                assert_eq!(position, "thanks");
                assert!(ai_fallback);
                assert_eq!(delivered, 0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            fx.channel.sent_texts(),
            ["Hi", "Name?", "Thanks", "Happy to help"]
        );
        assert_eq!(fx.gemini.requests()[0].api_key, "g-default");
    }

    #[tokio::test]
    async fn no_flow_and_ai_disabled_is_silent() {
        let fx = Fixture::new().await;
        let mut page = TestHarness::page("p3", "t1");
        page.ai_enabled = false;
        fx.harness.insert_page(&page).await;
        let mut ev = event("u1", "hello");
        ev.page = PageRef::Id("p3".into());

        assert_eq!(fx.engine.handle_event(ev).await, EventOutcome::NoReply);
        assert_eq!(fx.channel.sent_count(), 0);
        let log = fx.harness.storage().recent_messages("p3", "u1", 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::User);
    }

    #[tokio::test]
    async fn batch_keeps_sender_order_and_isolates_drops() {
        let fx = Fixture::new().await;
        let (nodes, edges) = greeting_flow();
        fx.harness.insert_flow("p1", "f1", nodes, edges, true).await;
        let mut ghost = event("u9", "hello");
        ghost.page = PageRef::External("nope".into());

        let outcomes = fx
            .engine
            .handle_batch(vec![
                event("u1", "hello"),
                ghost,
                event("u2", "hello"),
                event("u1", "Ada"),
            ])
            .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[1], EventOutcome::Dropped(DropReason::UnknownPage));
        assert!(matches!(&outcomes[0], EventOutcome::Flow { position, .. } if position == "ask"));
        assert!(matches!(&outcomes[2], EventOutcome::Flow { position, .. } if position == "ask"));
        assert!(matches!(&outcomes[3], EventOutcome::Flow { position, .. } if position == "thanks"));

        let u1: Vec<String> = fx
            .channel
            .sent_messages()
            .into_iter()
            .filter(|m| m.recipient_id == "u1")
            .map(|m| m.payload.transcript())
            .collect();
        assert_eq!(u1, ["Hi", "Name?", "Thanks"]);
    }
}
