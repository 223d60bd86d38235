// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.

use std::time::Duration;

use pagebot_core::PagebotError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client with bearer authentication supplied per call.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    max_retries: u32,
    endpoint: String,
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com`).
    pub fn new(base_url: &str) -> Result<Self, PagebotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PagebotError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// Sends a completion request.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn chat(&self, api_key: &str, request: &ChatRequest) -> Result<ChatResponse, PagebotError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying chat completion after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| PagebotError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "chat completion response received");

            if status.is_success() {
                return response.json::<ChatResponse>().await.map_err(|e| PagebotError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(PagebotError::provider(format!("API returned {status}: {body}")));
                continue;
            }

            let error_msg = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(PagebotError::provider(error_msg));
        }

        Err(last_error.unwrap_or_else(|| PagebotError::provider("chat completion failed after retries")))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: Some("Hello".into()),
            }],
            max_tokens: 1000,
        }
    }

    fn ok_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
        })
    }

    #[tokio::test]
    async fn uses_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Hi")))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri()).unwrap();
        let resp = client.chat("sk-page", &request()).await.unwrap();
        assert_eq!(resp.first_text(), Some("Hi"));
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("after retry")))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri()).unwrap();
        let resp = client.chat("k", &request()).await.unwrap();
        assert_eq!(resp.first_text(), Some("after retry"));
    }

    #[tokio::test]
    async fn exhausts_retries_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"message": "boom", "type": "server_error"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri()).unwrap();
        let err = client.chat("k", &request()).await.unwrap_err().to_string();
        assert!(err.contains("server_error"), "got: {err}");
    }
}
