// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter that captures outbound messages.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use pagebot_core::traits::adapter::PluginAdapter;
use pagebot_core::traits::channel::ChannelAdapter;
use pagebot_core::types::{AdapterType, Channel, HealthStatus, MessageId, OutboundMessage};
use pagebot_core::PagebotError;

/// A channel whose sends are captured for assertions.
pub struct MockChannel {
    channel: Channel,
    sent: Mutex<Vec<OutboundMessage>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockChannel {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            sent: Mutex::new(Vec::new()),
            delay: None,
            fail: false,
        }
    }

    /// Sleep this long inside every `send`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Record sends but report every one as failed.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every message passed to `send`, in call order.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Transcript text of each sent message.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_messages()
            .iter()
            .map(|m| m.payload.transcript())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
impl ChannelAdapter for MockChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PagebotError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(msg);
        if self.fail {
            return Err(PagebotError::channel("mock send failure"));
        }
        Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}
