// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use pagebot_core::PagebotError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for `base_url` (e.g. `https://generativelanguage.googleapis.com`).
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
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Calls `models/{model}:generateContent`, authenticating with the `key`
    /// query parameter.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn generate(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, PagebotError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v1beta/models/{model}:generateContent", self.base_url),
            &[("key", api_key)],
        )
        .map_err(|e| PagebotError::Config(format!("invalid Gemini endpoint: {e}")))?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, model, "retrying generateContent after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(url.clone())
                .json(request)
                .send()
                .await
                .map_err(|e| PagebotError::Provider {
                    // Strip the URL: it carries the key.
                    message: format!("HTTP request failed: {}", e.without_url()),
                    source: None,
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model, "generateContent response received");

            if status.is_success() {
                return response
                    .json::<GenerateResponse>()
                    .await
                    .map_err(|e| PagebotError::Provider {
                        message: format!("failed to parse API response: {}", e.without_url()),
                        source: None,
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
                    "Gemini API error ({} {}): {}",
                    api_err.error.code,
                    api_err.error.status.as_deref().unwrap_or("UNKNOWN"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(PagebotError::provider(error_msg));
        }

        Err(last_error.unwrap_or_else(|| PagebotError::provider("generateContent failed after retries")))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, GenerationConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateRequest {
        GenerateRequest {
            system_instruction: None,
            contents: vec![Content::text(Some("user"), "Hi")],
            generation_config: GenerationConfig {
                max_output_tokens: 1000,
            },
        }
    }

    #[tokio::test]
    async fn key_goes_in_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let resp = client
            .generate("gemini-2.0-flash", "g-key", &request())
            .await
            .unwrap();
        assert_eq!(resp.text().as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn error_envelope_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let err = client
            .generate("gemini-2.0-flash", "bad", &request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("INVALID_ARGUMENT"), "got: {err}");
        assert!(!err.contains("bad"), "key leaked: {err}");
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri()).unwrap();
        let resp = client.generate("m", "k", &request()).await.unwrap();
        assert_eq!(resp.text().as_deref(), Some("ok"));
    }
}
