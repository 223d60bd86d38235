// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the engine, the storage layer and the adapters.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a delivered message, as reported by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

/// Transport a conversation runs over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Messenger,
    Webchat,
}

/// Author of a logged message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Subscription tier of a tenant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Plan {
    Starter,
    Business,
    Pro,
}

// --- Tenant and page records ---

/// A tenant account. `plan` is kept as stored so unknown tiers stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: String,
    pub message_count: i64,
}

impl Tenant {
    /// Parsed plan tier, `None` when the stored name is not a known tier.
    pub fn plan_tier(&self) -> Option<Plan> {
        self.plan.parse().ok()
    }
}

/// Per-provider comma-separated API key lists configured on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderKeys {
    pub openai_keys: Option<String>,
    pub anthropic_keys: Option<String>,
    pub gemini_keys: Option<String>,
}

/// A tenant-owned channel endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub owner_id: String,
    /// Identifier the channel uses for this page (e.g. the Facebook page id).
    pub external_id: String,
    pub name: String,
    pub is_active: bool,
    pub ai_enabled: bool,
    pub ai_prompt: Option<String>,
    pub ai_keys: ProviderKeys,
    /// Channel access token, already decrypted by the identity layer.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

/// A flow as persisted: node and edge graphs are opaque JSON until loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: String,
    pub page_id: String,
    pub name: String,
    pub is_active: bool,
    pub is_default: bool,
    pub nodes: serde_json::Value,
    pub edges: serde_json::Value,
}

/// How a keyword rule compares against inbound text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Contains,
    Regex,
}

/// A keyword trigger redirecting matching text into a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub id: String,
    pub page_id: String,
    pub keyword: String,
    pub match_type: MatchType,
    pub flow_id: String,
}

// --- Conversation state ---

/// Identity of one conversation cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub page_id: String,
    pub user_id: String,
    pub channel: Channel,
}

impl ConversationKey {
    pub fn new(page_id: impl Into<String>, user_id: impl Into<String>, channel: Channel) -> Self {
        Self {
            page_id: page_id.into(),
            user_id: user_id.into(),
            channel,
        }
    }
}

/// Persisted position of a user inside a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub key: ConversationKey,
    pub flow_id: String,
    /// Node the user is parked at; `None` before the first pass completes.
    pub state: Option<String>,
    pub last_interaction: String,
}

/// A message about to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub page_id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub channel: Channel,
}

/// A message read back from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub page_id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub channel: Channel,
    pub created_at: String,
}

/// A single contact variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVariable {
    pub key: String,
    pub value: String,
}

/// Message volume for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// Aggregate page activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_messages: i64,
    pub active_users: i64,
    pub total_flows: i64,
    pub messages_over_time: Vec<DailyCount>,
}

// --- Inbound and outbound content ---

/// How an inbound event names its page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageRef {
    /// Internal page id (webchat widget).
    Id(String),
    /// Channel-side page id (Messenger webhook recipient).
    External(String),
}

/// One inbound unit of content from one sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub channel: Channel,
    pub page: PageRef,
    pub sender_id: String,
    /// Already resolved from text, quick-reply payload or postback payload.
    pub text: String,
}

/// Canonical payload shapes every channel must accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundPayload {
    Text { text: String },
    Image { url: String },
    QuickReplies { text: String, replies: Vec<String> },
    Buttons { text: String, buttons: Vec<String> },
}

impl OutboundPayload {
    /// Plain-text rendering written to the message log.
    pub fn transcript(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Image { .. } => "[Attachment: image]".to_string(),
            Self::QuickReplies { text, replies } => {
                format!("{text} [Quick Replies: {}]", replies.join(", "))
            }
            Self::Buttons { text, buttons } => {
                format!("{text} [Buttons: {}]", buttons.join(", "))
            }
        }
    }
}

/// A payload addressed to one recipient on one page.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: Channel,
    pub page_id: String,
    pub page_access_token: Option<String>,
    pub recipient_id: String,
    pub payload: OutboundPayload,
}

/// Node-level overrides for an AI reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiOverrides {
    /// Replaces the inbound text as the user turn.
    pub prompt: Option<String>,
    /// Replaces the page prompt as the base system instruction.
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub knowledge_base: Option<String>,
    pub fallback_message: Option<String>,
}

// --- Provider types ---

/// One turn of chat history sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A single non-streaming completion request.
#[derive(Debug)]
pub struct ProviderRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
    /// Credential chosen for this call.
    pub api_key: SecretString,
}

/// Generated text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub text: String,
    pub model: String,
}
