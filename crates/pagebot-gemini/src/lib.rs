// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Pagebot.
//!
//! Gemini serves every model name that does not belong to another family,
//! including the configured default model.

pub mod client;
pub mod types;

use async_trait::async_trait;
use pagebot_config::model::GeminiConfig;
use pagebot_core::error::PagebotError;
use pagebot_core::traits::{PluginAdapter, ProviderAdapter};
use pagebot_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse, Role};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateRequest, GenerationConfig};

pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, PagebotError> {
        let client = GeminiClient::new(&config.base_url)?;
        info!(base_url = config.base_url.as_str(), "Gemini provider initialized");
        Ok(Self { client })
    }

    fn to_generate_request(request: &ProviderRequest) -> GenerateRequest {
        let contents = request
            .messages
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Content::text(Some(role), &turn.content)
            })
            .collect();

        GenerateRequest {
            system_instruction: (!request.system.is_empty())
                .then(|| Content::text(None, &request.system)),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PagebotError> {
        let body = Self::to_generate_request(&request);
        let response = self
            .client
            .generate(&request.model, request.api_key.expose_secret(), &body)
            .await?;
        let text = response
            .text()
            .ok_or_else(|| PagebotError::provider("Gemini returned no candidate text"))?;
        Ok(ProviderResponse {
            text,
            model: response.model_version.unwrap_or(request.model),
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
            model: "gemini-3-flash-preview".into(),
            system: "You are a helpful assistant.\n\nUser Tags: vip".into(),
            messages: vec![
                ChatTurn {
                    role: Role::User,
                    content: "Hi".into(),
                },
                ChatTurn {
                    role: Role::Assistant,
                    content: "Hello".into(),
                },
                ChatTurn {
                    role: Role::User,
                    content: "Hours?".into(),
                },
            ],
            max_tokens: 1000,
            api_key: SecretString::from("g1"),
        }
    }

    #[test]
    fn assistant_turns_use_model_role() {
        let req = GeminiProvider::to_generate_request(&request());
        let roles: Vec<_> = req.contents.iter().map(|c| c.role.as_deref()).collect();
        assert_eq!(roles, [Some("user"), Some("model"), Some("user")]);
        assert!(req.system_instruction.is_some());
    }

    #[tokio::test]
    async fn complete_sends_system_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-3-flash-preview:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "You are a helpful assistant.\n\nUser Tags: vip"}]},
                "generationConfig": {"maxOutputTokens": 1000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "9 to 5."}]}}],
                "modelVersion": "gemini-3-flash-preview-001"
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(&GeminiConfig {
            api_key: None,
            base_url: server.uri(),
        })
        .unwrap();
        let resp = provider.complete(request()).await.unwrap();
        assert_eq!(resp.text, "9 to 5.");
        assert_eq!(resp.model, "gemini-3-flash-preview-001");
    }
}
