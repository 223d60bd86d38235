// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider family selection by model name.

use pagebot_config::model::ProvidersConfig;
use pagebot_core::types::ProviderKeys;
use strum::Display;

/// A generative provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderFamily {
    /// `gpt*` models go to OpenAI, `claude*` to Anthropic, everything else
    /// to Gemini.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gpt") {
            Self::OpenAi
        } else if model.starts_with("claude") {
            Self::Anthropic
        } else {
            Self::Gemini
        }
    }

    /// The page's comma-separated key list for this family.
    pub fn page_keys(self, keys: &ProviderKeys) -> Option<&str> {
        match self {
            Self::OpenAi => keys.openai_keys.as_deref(),
            Self::Anthropic => keys.anthropic_keys.as_deref(),
            Self::Gemini => keys.gemini_keys.as_deref(),
        }
    }

    /// The process-wide default key for this family.
    pub fn default_key(self, providers: &ProvidersConfig) -> Option<&str> {
        match self {
            Self::OpenAi => providers.openai.api_key.as_deref(),
            Self::Anthropic => providers.anthropic.api_key.as_deref(),
            Self::Gemini => providers.gemini.api_key.as_deref(),
        }
    }
}
