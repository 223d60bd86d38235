// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for Pagebot.
//!
//! Implements [`ProviderAdapter`] over the non-streaming Messages API.

pub mod client;
pub mod types;

use async_trait::async_trait;
use pagebot_config::model::AnthropicConfig;
use pagebot_core::error::PagebotError;
use pagebot_core::traits::{PluginAdapter, ProviderAdapter};
use pagebot_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse, Role};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic provider implementing [`ProviderAdapter`].
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    pub fn new(config: &AnthropicConfig) -> Result<Self, PagebotError> {
        let client = AnthropicClient::new(&config.base_url, &config.api_version)?;
        info!(base_url = config.base_url.as_str(), "Anthropic provider initialized");
        Ok(Self { client })
    }

    fn to_message_request(request: &ProviderRequest) -> MessageRequest {
        let messages = request
            .messages
            .iter()
            .map(|turn| ApiMessage {
                role: match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: turn.content.clone(),
            })
            .collect();

        MessageRequest {
            model: request.model.clone(),
            messages,
            system: (!request.system.is_empty()).then(|| request.system.clone()),
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PagebotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PagebotError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PagebotError> {
        let api_request = Self::to_message_request(&request);
        let response = self
            .client
            .complete_message(request.api_key.expose_secret(), &api_request)
            .await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(PagebotError::provider("Anthropic returned no text"));
        }
        Ok(ProviderResponse {
            text,
            model: response.model,
        })
    }
}
