// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider adapter for Pagebot.
//!
//! Used for models whose name starts with `gpt`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use pagebot_config::model::OpenAiConfig;
use pagebot_core::error::PagebotError;
use pagebot_core::traits::{PluginAdapter, ProviderAdapter};
use pagebot_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse, Role};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, PagebotError> {
        let client = OpenAiClient::new(&config.base_url)?;
        info!(base_url = config.base_url.as_str(), "OpenAI provider initialized");
        Ok(Self { client })
    }

    fn to_chat_request(request: &ProviderRequest) -> ChatRequest {
        let system = (!request.system.is_empty()).then(|| ChatMessage {
            role: "system".into(),
            content: Some(request.system.clone()),
        });
        let turns = request.messages.iter().map(|turn| ChatMessage {
            role: match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            }
            .into(),
            content: Some(turn.content.clone()),
        });

        ChatRequest {
            model: request.model.clone(),
            messages: system.into_iter().chain(turns).collect(),
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PagebotError> {
        let chat = Self::to_chat_request(&request);
        let response = self.client.chat(request.api_key.expose_secret(), &chat).await?;
        let text = response
            .first_text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PagebotError::provider("OpenAI returned no content"))?
            .to_string();
        Ok(ProviderResponse {
            text,
            model: if response.model.is_empty() {
                request.model
            } else {
                response.model
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebot_core::types::ChatTurn;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            system: "Be kind.".into(),
            messages: vec![ChatTurn {
                role: Role::User,
                content: "Hi".into(),
            }],
            max_tokens: 1000,
            api_key: SecretString::from("sk-1"),
        }
    }

    #[test]
    fn system_becomes_first_message() {
        let chat = OpenAiProvider::to_chat_request(&request());
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[0].content.as_deref(), Some("Be kind."));
        assert_eq!(chat.messages[1].role, "user");
    }

    #[tokio::test]
    async fn complete_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "Be kind."},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&OpenAiConfig {
            api_key: None,
            base_url: server.uri(),
        })
        .unwrap();
        let resp = provider.complete(request()).await.unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.model, "gpt-4o-mini-2024-07-18");
    }

    #[tokio::test]
    async fn no_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&OpenAiConfig {
            api_key: None,
            base_url: server.uri(),
        })
        .unwrap();
        assert!(provider.complete(request()).await.is_err());
    }
}
