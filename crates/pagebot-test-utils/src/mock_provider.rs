// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with a queue of scripted
//! outcomes and records every request it receives.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use pagebot_core::traits::adapter::PluginAdapter;
use pagebot_core::traits::provider::ProviderAdapter;
use pagebot_core::types::{AdapterType, ChatTurn, HealthStatus, ProviderRequest, ProviderResponse};
use pagebot_core::PagebotError;

/// A request as seen by the mock, with the key exposed for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
    pub api_key: String,
}

enum Scripted {
    Reply(String),
    Error(String),
}

/// A provider that answers from a FIFO queue.
///
/// When the queue is empty, `"mock reply"` is returned.
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::named("mock-provider")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: &str) {
        self.lock_script().push_back(Scripted::Reply(text.to_string()));
    }

    /// Queue a provider error.
    pub fn push_error(&self, message: &str) {
        self.lock_script()
            .push_back(Scripted::Error(message.to_string()));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
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
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PagebotError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                model: request.model.clone(),
                system: request.system.clone(),
                messages: request.messages.clone(),
                max_tokens: request.max_tokens,
                api_key: request.api_key.expose_secret().to_string(),
            });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.lock_script().pop_front();
        match next {
            Some(Scripted::Error(message)) => Err(PagebotError::provider(message)),
            Some(Scripted::Reply(text)) => Ok(ProviderResponse {
                text,
                model: request.model,
            }),
            None => Ok(ProviderResponse {
                text: "mock reply".to_string(),
                model: request.model,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebot_core::types::Role;
    use secrecy::SecretString;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "m".into(),
            system: "s".into(),
            messages: vec![ChatTurn {
                role: Role::User,
                content: "hi".into(),
            }],
            max_tokens: 10,
            api_key: SecretString::from("k"),
        }
    }

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let provider = MockProvider::new();
        provider.push_error("down");
        provider.push_reply("up");

        assert!(provider.complete(request()).await.is_err());
        assert_eq!(provider.complete(request()).await.unwrap().text, "up");
        assert_eq!(provider.complete(request()).await.unwrap().text, "mock reply");

        let recorded = provider.requests();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].api_key, "k");
    }
}
