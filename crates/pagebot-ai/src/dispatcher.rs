// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI reply dispatch.
//!
//! Builds the prompt context from the message log and contact data, picks a
//! provider by model name and a key from the page's rotation list, and calls
//! the provider under a timeout. Any failure turns into a fallback reply; the
//! dispatcher never returns an error to the engine.

use std::sync::Arc;
use std::time::Duration;

use pagebot_config::model::{AiConfig, ProvidersConfig};
use pagebot_core::types::{AiOverrides, Page, ProviderRequest, ProviderResponse};
use pagebot_core::{PagebotError, ProviderAdapter, StorageAdapter};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::context;
use crate::family::ProviderFamily;
use crate::keys::KeyRotator;

/// One adapter per provider family.
#[derive(Clone)]
pub struct Providers {
    pub openai: Arc<dyn ProviderAdapter>,
    pub anthropic: Arc<dyn ProviderAdapter>,
    pub gemini: Arc<dyn ProviderAdapter>,
}

impl Providers {
    pub fn get(&self, family: ProviderFamily) -> &Arc<dyn ProviderAdapter> {
        match family {
            ProviderFamily::OpenAi => &self.openai,
            ProviderFamily::Anthropic => &self.anthropic,
            ProviderFamily::Gemini => &self.gemini,
        }
    }
}

/// Input for one AI reply.
#[derive(Debug, Clone, Copy)]
pub struct AiRequest<'a> {
    pub page: &'a Page,
    pub user_id: &'a str,
    /// The inbound message text.
    pub text: &'a str,
    /// Node-level overrides; `None` for the top-level fallback.
    pub overrides: Option<&'a AiOverrides>,
}

/// The text to send back, and whether a provider produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
    pub text: String,
    /// `false` when this is a fallback message. Only generated replies are
    /// billable.
    pub generated: bool,
}

pub struct AiDispatcher {
    config: AiConfig,
    credentials: ProvidersConfig,
    providers: Providers,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    rotator: KeyRotator,
}

impl AiDispatcher {
    pub fn new(
        config: AiConfig,
        credentials: ProvidersConfig,
        providers: Providers,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
    ) -> Self {
        Self {
            config,
            credentials,
            providers,
            storage,
            rotator: KeyRotator::default(),
        }
    }

    /// Replace the key rotator, e.g. with a seeded one.
    pub fn with_rotator(mut self, rotator: KeyRotator) -> Self {
        self.rotator = rotator;
        self
    }

    /// Produce a reply. Provider, credential, and timeout failures are logged
    /// and answered with the fallback message.
    pub async fn reply(&self, request: AiRequest<'_>) -> AiReply {
        match self.generate(request).await {
            Ok(response) => {
                info!(
                    page_id = request.page.id.as_str(),
                    user_id = request.user_id,
                    model = response.model.as_str(),
                    "AI reply generated"
                );
                AiReply {
                    text: response.text,
                    generated: true,
                }
            }
            Err(e) => {
                warn!(
                    page_id = request.page.id.as_str(),
                    user_id = request.user_id,
                    error = %e,
                    "AI reply failed, sending fallback"
                );
                let text = request
                    .overrides
                    .and_then(|o| non_empty(o.fallback_message.as_deref()))
                    .unwrap_or(&self.config.fallback_message)
                    .to_string();
                AiReply {
                    text,
                    generated: false,
                }
            }
        }
    }

    async fn generate(&self, request: AiRequest<'_>) -> Result<ProviderResponse, PagebotError> {
        let overrides = request.overrides;
        let page = request.page;

        let model = overrides
            .and_then(|o| non_empty(o.model.as_deref()))
            .unwrap_or(&self.config.default_model)
            .to_string();
        let family = ProviderFamily::for_model(&model);
        let api_key = self
            .api_key(family, page)
            .ok_or_else(|| PagebotError::provider(format!("no {family} API key configured")))?;

        let history = self
            .storage
            .recent_messages(&page.id, request.user_id, self.config.history_window)
            .await?;
        let variables = self.storage.list_variables(&page.id, request.user_id).await?;
        let tags = self.storage.list_tags(&page.id, request.user_id).await?;

        let base_prompt = overrides
            .and_then(|o| non_empty(o.system_prompt.as_deref()))
            .or_else(|| non_empty(page.ai_prompt.as_deref()))
            .unwrap_or(&self.config.default_system_prompt);
        let system = context::system_instruction(
            base_prompt,
            &variables,
            &tags,
            overrides.and_then(|o| o.knowledge_base.as_deref()),
        );
        let user_turn = overrides
            .and_then(|o| non_empty(o.prompt.as_deref()))
            .unwrap_or(request.text);
        let messages = context::conversation_turns(&history, user_turn);

        debug!(
            page_id = page.id.as_str(),
            %family,
            model = model.as_str(),
            history = history.len(),
            "dispatching AI request"
        );

        let provider_request = ProviderRequest {
            model,
            system,
            messages,
            max_tokens: self.config.max_output_tokens,
            api_key: SecretString::from(api_key),
        };
        let duration = Duration::from_secs(self.config.timeout_secs);
        tokio::time::timeout(duration, self.providers.get(family).complete(provider_request))
            .await
            .map_err(|_| PagebotError::Timeout { duration })?
    }

    /// Page rotation list first, then the process-wide default.
    fn api_key(&self, family: ProviderFamily, page: &Page) -> Option<String> {
        match family.page_keys(&page.ai_keys) {
            Some(list) if !list.trim().is_empty() => self.rotator.pick(list),
            _ => non_empty(family.default_key(&self.credentials)).map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
