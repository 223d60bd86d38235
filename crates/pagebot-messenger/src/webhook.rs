// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messenger webhook decoding and verification.

use hmac::{Hmac, Mac};
use pagebot_core::types::{Channel, InboundEvent, PageRef};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Top-level webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One page's batch of events; `id` is the page's external id.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub quick_reply: Option<QuickReply>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickReply {
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    #[serde(default)]
    pub payload: String,
}

impl WebhookPayload {
    /// Whether this webhook is addressed to pages.
    pub fn is_page_object(&self) -> bool {
        self.object == "page"
    }

    /// Inbound events in delivery order.
    ///
    /// A quick-reply payload replaces the message text; postbacks carry
    /// their payload as text. Echoes and events without text are dropped.
    pub fn events(&self) -> Vec<InboundEvent> {
        self.entry
            .iter()
            .flat_map(|entry| {
                entry.messaging.iter().filter_map(move |event| {
                    let text = event_text(event)?;
                    Some(InboundEvent {
                        channel: Channel::Messenger,
                        page: PageRef::External(entry.id.clone()),
                        sender_id: event.sender.id.clone(),
                        text,
                    })
                })
            })
            .collect()
    }
}

fn event_text(event: &MessagingEvent) -> Option<String> {
    let text = match (&event.message, &event.postback) {
        (Some(message), _) if !message.is_echo => match &message.quick_reply {
            Some(quick_reply) => quick_reply.payload.clone(),
            None => message.text.clone().unwrap_or_default(),
        },
        (Some(_), _) => {
            debug!(sender = event.sender.id.as_str(), "ignoring echo");
            return None;
        }
        (None, Some(postback)) => postback.payload.clone(),
        (None, None) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Check an `X-Hub-Signature-256` value (`sha256=<hex>`) against the raw body.
pub fn verify_signature(app_secret: &str, signature: Option<&str>, body: &[u8]) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    let hex_digest = signature.trim();
    let hex_digest = hex_digest.strip_prefix("sha256=").unwrap_or(hex_digest);
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Subscription handshake: the challenge to echo, or `None` to refuse.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    match (mode, token, challenge) {
        (Some("subscribe"), Some(token), Some(challenge)) if token == expected_token => {
            Some(challenge.to_string())
        }
        _ => None,
    }
}

/// Sign `body` the way Messenger does. Used by tests and tooling.
pub fn sign(app_secret: &str, body: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
