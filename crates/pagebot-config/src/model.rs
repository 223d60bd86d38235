// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pagebot engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Pagebot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PagebotConfig {
    /// Engine behavior and logging.
    #[serde(default)]
    pub engine: EngineConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messenger webhook and Graph API settings.
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Per-plan message ceilings.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// AI fallback behavior.
    #[serde(default)]
    pub ai: AiConfig,

    /// Provider credentials and endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on node moves in one interpreter pass.
    #[serde(default = "default_max_flow_steps")]
    pub max_flow_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_flow_steps: default_max_flow_steps(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_flow_steps() -> usize {
    20
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pagebot").join("pagebot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pagebot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Messenger webhook and Graph API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessengerConfig {
    /// Token expected in `hub.verify_token` during webhook subscription.
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// App secret used to check `X-Hub-Signature-256`. Unset disables the check.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,

    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            verify_token: default_verify_token(),
            app_secret: None,
            graph_api_version: default_graph_api_version(),
            graph_base_url: default_graph_base_url(),
        }
    }
}

fn default_verify_token() -> String {
    "pagebot".to_string()
}

fn default_graph_api_version() -> String {
    "v18.0".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

/// Message ceilings per plan tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    #[serde(default = "default_starter_ceiling")]
    pub starter: i64,

    #[serde(default = "default_business_ceiling")]
    pub business: i64,

    #[serde(default = "default_pro_ceiling")]
    pub pro: i64,

    /// Ceiling for plan names that are not a known tier.
    #[serde(default = "default_starter_ceiling")]
    pub unknown: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            starter: default_starter_ceiling(),
            business: default_business_ceiling(),
            pro: default_pro_ceiling(),
            unknown: default_starter_ceiling(),
        }
    }
}

fn default_starter_ceiling() -> i64 {
    1000
}

fn default_business_ceiling() -> i64 {
    10_000
}

fn default_pro_ceiling() -> i64 {
    100_000
}

/// AI fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Model used when neither the node nor the page names one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base system instruction when no prompt is configured.
    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,

    /// Number of logged messages included as history.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Bound on a single provider call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Reply sent when a provider call fails and the node has no fallback.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_system_prompt: default_system_prompt(),
            history_window: default_history_window(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            fallback_message: default_fallback_message(),
        }
    }
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_history_window() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_fallback_message() -> String {
    "I'm having trouble thinking right now. Please try again later.".to_string()
}

/// Provider endpoint and default credential configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// OpenAI chat completions settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Process-wide key used when a page has none.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Process-wide key used when a page has none.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    #[serde(default = "default_anthropic_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_anthropic_base_url(),
            api_version: default_anthropic_api_version(),
        }
    }
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_api_version() -> String {
    "2023-06-01".to_string()
}

/// Gemini generateContent settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Process-wide key used when a page has none.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_literals() {
        let config = PagebotConfig::default();
        assert_eq!(config.engine.max_flow_steps, 20);
        assert_eq!(config.ai.history_window, 10);
        assert_eq!(config.quota.starter, 1000);
        assert_eq!(config.quota.business, 10_000);
        assert_eq!(config.quota.pro, 100_000);
        assert_eq!(config.quota.unknown, 1000);
        assert_eq!(config.messenger.verify_token, "pagebot");
        assert!(config.messenger.app_secret.is_none());
    }

    #[test]
    fn default_database_path_ends_with_file_name() {
        assert!(StorageConfig::default().database_path.ends_with("pagebot.db"));
    }
}
