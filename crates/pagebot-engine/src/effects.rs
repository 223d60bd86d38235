// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use pagebot_ai::{AiDispatcher, AiRequest};
use pagebot_core::types::AiOverrides;
use pagebot_core::{OutboundPayload, StorageAdapter};
use pagebot_flow::NodeEffects;
use tracing::{debug, warn};

use crate::outbox::{Outbox, Recipient};

/// Node side effects for one pass, bound to one recipient.
pub(crate) struct FlowEffects<'a> {
    pub outbox: &'a Outbox,
    pub storage: &'a (dyn StorageAdapter + Send + Sync),
    pub ai: &'a AiDispatcher,
    pub to: Recipient<'a>,
    pub delivered: usize,
}

#[async_trait]
impl NodeEffects for FlowEffects<'_> {
    async fn send(&mut self, node_id: &str, payload: OutboundPayload) {
        debug!(page_id = self.to.page.id.as_str(), node_id, "sending node payload");
        self.outbox.deliver(self.to, payload, true).await;
        self.delivered += 1;
    }

    async fn set_variable(&mut self, key: &str, value: &str) {
        let page_id = self.to.page.id.as_str();
        if let Err(e) = self
            .storage
            .set_variable(page_id, self.to.user_id, key, value)
            .await
        {
            warn!(page_id, user_id = self.to.user_id, key, error = %e, "failed to set variable");
        }
    }

    async fn add_tag(&mut self, tag: &str) {
        let page_id = self.to.page.id.as_str();
        if let Err(e) = self.storage.add_tag(page_id, self.to.user_id, tag).await {
            warn!(page_id, user_id = self.to.user_id, tag, error = %e, "failed to add tag");
        }
    }

    async fn ai_response(&mut self, node_id: &str, overrides: &AiOverrides, text: &str) {
        debug!(page_id = self.to.page.id.as_str(), node_id, "AI node");
        let reply = self
            .ai
            .reply(AiRequest {
                page: self.to.page,
                user_id: self.to.user_id,
                text,
                overrides: Some(overrides),
            })
            .await;
        self.outbox
            .deliver(self.to, OutboundPayload::Text { text: reply.text }, reply.generated)
            .await;
        self.delivered += 1;
    }
}
