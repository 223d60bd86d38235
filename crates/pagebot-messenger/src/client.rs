// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API Send client.

use std::time::Duration;

use pagebot_core::PagebotError;
use pagebot_core::types::OutboundPayload;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Messenger caps button templates at three buttons.
pub const MAX_BUTTONS: usize = 3;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Client for `POST /{version}/me/messages`.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphClient {
    pub fn new(base_url: &str, api_version: &str) -> Result<Self, PagebotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PagebotError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/me/messages",
                base_url.trim_end_matches('/'),
                api_version.trim_matches('/')
            ),
        })
    }

    /// Sends one payload as a `RESPONSE` message. Returns the Graph message id.
    pub async fn send(
        &self,
        access_token: &str,
        recipient_id: &str,
        payload: &OutboundPayload,
    ) -> Result<String, PagebotError> {
        let url = reqwest::Url::parse_with_params(&self.endpoint, &[("access_token", access_token)])
            .map_err(|e| PagebotError::Channel {
                message: format!("invalid Graph API endpoint: {e}"),
                source: Some(Box::new(e)),
            })?;
        let body = json!({
            "recipient": { "id": recipient_id },
            "message": message_body(payload),
            "messaging_type": "RESPONSE",
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                PagebotError::Channel {
                    message: format!("Graph API request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

        let status = response.status();
        debug!(status = %status, recipient = recipient_id, "Graph API send response");
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            let parsed: SendResponse = serde_json::from_str(&text).unwrap_or(SendResponse { message_id: None });
            return Ok(parsed.message_id.unwrap_or_default());
        }

        let message = match serde_json::from_str::<GraphErrorResponse>(&text) {
            Ok(err) => format!(
                "Graph API error ({}): {}",
                err.error.code.unwrap_or_default(),
                err.error.message
            ),
            Err(_) => format!("Graph API returned {status}: {text}"),
        };
        Err(PagebotError::channel(message))
    }
}

/// The `message` object for a payload.
pub fn message_body(payload: &OutboundPayload) -> Value {
    match payload {
        OutboundPayload::Text { text } => json!({ "text": text }),
        OutboundPayload::Image { url } => json!({
            "attachment": {
                "type": "image",
                "payload": { "url": url, "is_reusable": true }
            }
        }),
        OutboundPayload::QuickReplies { text, replies } => {
            let quick_replies: Vec<Value> = replies
                .iter()
                .map(|r| json!({ "content_type": "text", "title": r, "payload": r }))
                .collect();
            json!({ "text": text, "quick_replies": quick_replies })
        }
        OutboundPayload::Buttons { text, buttons } => {
            let buttons: Vec<Value> = buttons
                .iter()
                .take(MAX_BUTTONS)
                .map(|b| json!({ "type": "postback", "title": b, "payload": b }))
                .collect();
            json!({
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "button",
                        "text": text,
                        "buttons": buttons
                    }
                }
            })
        }
    }
}
