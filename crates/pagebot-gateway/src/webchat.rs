// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webchat delivery.
//!
//! The widget polls `GET /api/webchat/messages`, which reads the message
//! log. Replies therefore need no transport: the engine logs every outbound
//! message, and this adapter only acknowledges the send.

use async_trait::async_trait;
use pagebot_core::traits::{ChannelAdapter, PluginAdapter};
use pagebot_core::types::{AdapterType, Channel, HealthStatus, MessageId, OutboundMessage};
use pagebot_core::PagebotError;
use tracing::debug;

#[derive(Debug, Default)]
pub struct WebchatChannel;

impl WebchatChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for WebchatChannel {
    fn name(&self) -> &str {
        "webchat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PagebotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PagebotError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WebchatChannel {
    fn channel(&self) -> Channel {
        Channel::Webchat
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PagebotError> {
        debug!(
            page_id = msg.page_id.as_str(),
            recipient = msg.recipient_id.as_str(),
            "webchat reply queued for polling"
        );
        Ok(MessageId(uuid::Uuid::new_v4().to_string()))
    }
}
