// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use pagebot_config::model::MessengerConfig;
use pagebot_core::traits::{ChannelAdapter, PluginAdapter};
use pagebot_core::types::{AdapterType, Channel, HealthStatus, MessageId, OutboundMessage};
use pagebot_core::PagebotError;
use tracing::{debug, info};

use crate::client::GraphClient;

/// Delivers outbound payloads through the Messenger Send API.
pub struct MessengerChannel {
    client: GraphClient,
}

impl MessengerChannel {
    pub fn new(config: &MessengerConfig) -> Result<Self, PagebotError> {
        let client = GraphClient::new(&config.graph_base_url, &config.graph_api_version)?;
        info!(
            version = config.graph_api_version.as_str(),
            "Messenger channel initialized"
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for MessengerChannel {
    fn name(&self) -> &str {
        "messenger"
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
        debug!("Messenger channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MessengerChannel {
    fn channel(&self) -> Channel {
        Channel::Messenger
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PagebotError> {
        let token = msg
            .page_access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PagebotError::channel(format!("page {} has no access token", msg.page_id))
            })?;
        let id = self
            .client
            .send(token, &msg.recipient_id, &msg.payload)
            .await?;
        Ok(MessageId(id))
    }
}
