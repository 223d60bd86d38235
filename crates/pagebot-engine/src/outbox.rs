// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery.
//!
//! Every unit of content the engine produces goes through [`Outbox::deliver`]:
//! it is handed to the channel adapter, written to the message log as an
//! `assistant` message, and counted against the tenant's quota when billable.
//! Each step is attempted regardless of the previous one failing.

use std::collections::HashMap;
use std::sync::Arc;

use pagebot_core::types::{Channel, MessageEntry, OutboundMessage, Page, Role, Tenant};
use pagebot_core::{ChannelAdapter, OutboundPayload, StorageAdapter};
use pagebot_quota::QuotaGate;
use tracing::{debug, warn};

/// Who a delivery is addressed to.
#[derive(Debug, Clone, Copy)]
pub struct Recipient<'a> {
    pub page: &'a Page,
    pub tenant: &'a Tenant,
    pub user_id: &'a str,
    pub channel: Channel,
}

/// Channel registry plus the log and usage bookkeeping around each send.
pub struct Outbox {
    channels: HashMap<Channel, Arc<dyn ChannelAdapter + Send + Sync>>,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    quota: Arc<QuotaGate>,
}

impl Outbox {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>, quota: Arc<QuotaGate>) -> Self {
        Self {
            channels: HashMap::new(),
            storage,
            quota,
        }
    }

    /// Register the adapter for its channel, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter + Send + Sync>) {
        self.channels.insert(adapter.channel(), adapter);
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Send, log, and (if `billable`) count one payload.
    pub async fn deliver(&self, to: Recipient<'_>, payload: OutboundPayload, billable: bool) {
        let transcript = payload.transcript();

        match self.channels.get(&to.channel) {
            Some(adapter) => {
                let message = OutboundMessage {
                    channel: to.channel,
                    page_id: to.page.id.clone(),
                    page_access_token: to.page.access_token.clone(),
                    recipient_id: to.user_id.to_string(),
                    payload,
                };
                match adapter.send(message).await {
                    Ok(id) => debug!(
                        page_id = to.page.id.as_str(),
                        user_id = to.user_id,
                        message_id = id.0.as_str(),
                        "payload delivered"
                    ),
                    Err(e) => warn!(
                        page_id = to.page.id.as_str(),
                        user_id = to.user_id,
                        channel = %to.channel,
                        error = %e,
                        "send failed"
                    ),
                }
            }
            None => warn!(channel = %to.channel, "no adapter registered for channel"),
        }

        let entry = MessageEntry {
            page_id: to.page.id.clone(),
            user_id: to.user_id.to_string(),
            role: Role::Assistant,
            content: transcript,
            channel: to.channel,
        };
        if let Err(e) = self.storage.append_message(&entry).await {
            warn!(page_id = to.page.id.as_str(), error = %e, "failed to log outbound message");
        }

        if billable {
            if let Err(e) = self.quota.record_outbound(to.tenant).await {
                warn!(tenant_id = to.tenant.id.as_str(), error = %e, "failed to record usage");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebot_test_utils::{MockChannel, TestHarness};

    async fn setup(channel: MockChannel) -> (TestHarness, Outbox, Arc<MockChannel>) {
        let harness = TestHarness::new().await;
        harness.insert_page(&TestHarness::page("p1", "t1")).await;
        let quota = Arc::new(QuotaGate::new(harness.config().quota, harness.storage()));
        let mut outbox = Outbox::new(harness.storage(), quota);
        let channel = Arc::new(channel);
        outbox.register(channel.clone());
        (harness, outbox, channel)
    }

    #[tokio::test]
    async fn deliver_sends_logs_and_counts() {
        let (harness, outbox, channel) = setup(MockChannel::new(Channel::Messenger)).await;
        let page = TestHarness::page("p1", "t1");
        let tenant = harness.storage().get_tenant("t1").await.unwrap().unwrap();
        let to = Recipient {
            page: &page,
            tenant: &tenant,
            user_id: "u1",
            channel: Channel::Messenger,
        };

        outbox
            .deliver(to, OutboundPayload::Text { text: "Hi".into() }, true)
            .await;

        assert_eq!(channel.sent_texts(), ["Hi"]);
        assert_eq!(channel.sent_messages()[0].page_access_token.as_deref(), Some("token-p1"));
        let log = harness.storage().recent_messages("p1", "u1", 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::Assistant);
        let tenant = harness.storage().get_tenant("t1").await.unwrap().unwrap();
        assert_eq!(tenant.message_count, 1);
    }

    #[tokio::test]
    async fn send_failure_still_logs_and_counts() {
        let (harness, outbox, channel) =
            setup(MockChannel::new(Channel::Messenger).failing()).await;
        let page = TestHarness::page("p1", "t1");
        let tenant = harness.storage().get_tenant("t1").await.unwrap().unwrap();
        let to = Recipient {
            page: &page,
            tenant: &tenant,
            user_id: "u1",
            channel: Channel::Messenger,
        };

        outbox
            .deliver(to, OutboundPayload::Text { text: "Hi".into() }, true)
            .await;

        assert_eq!(channel.sent_count(), 1);
        assert_eq!(harness.storage().recent_messages("p1", "u1", 10).await.unwrap().len(), 1);
        assert_eq!(
            harness.storage().get_tenant("t1").await.unwrap().unwrap().message_count,
            1
        );
    }

    #[tokio::test]
    async fn non_billable_delivery_is_not_counted() {
        let (harness, outbox, _channel) = setup(MockChannel::new(Channel::Webchat)).await;
        let page = TestHarness::page("p1", "t1");
        let tenant = harness.storage().get_tenant("t1").await.unwrap().unwrap();
        let to = Recipient {
            page: &page,
            tenant: &tenant,
            user_id: "u1",
            channel: Channel::Webchat,
        };

        outbox
            .deliver(to, OutboundPayload::Text { text: "Sorry".into() }, false)
            .await;

        assert_eq!(
            harness.storage().get_tenant("t1").await.unwrap().unwrap().message_count,
            0
        );
        let log = harness
            .storage()
            .list_messages("p1", "u1", Channel::Webchat)
            .await
            .unwrap();
        assert_eq!(log[0].content, "Sorry");
    }
}
