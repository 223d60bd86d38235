// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pagebot.toml` > `~/.config/pagebot/pagebot.toml` > `/etc/pagebot/pagebot.toml`
//! with environment variable overrides via `PAGEBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PagebotConfig;

/// Top-level sections that take a single `_` separator after the prefix.
const SECTIONS: &[&str] = &["engine", "server", "storage", "messenger", "quota", "ai"];

/// Provider subsections under `[providers.*]`.
const PROVIDERS: &[&str] = &["openai", "anthropic", "gemini"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pagebot/pagebot.toml` (system-wide)
/// 3. `~/.config/pagebot/pagebot.toml` (user XDG config)
/// 4. `./pagebot.toml` (local directory)
/// 5. `PAGEBOT_*` environment variables
pub fn load_config() -> Result<PagebotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PagebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PagebotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PagebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PagebotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PagebotConfig::default()))
        .merge(Toml::file("/etc/pagebot/pagebot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pagebot/pagebot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pagebot.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `PAGEBOT_AI_HISTORY_WINDOW` into
/// `ai.history.window`, so keys are mapped by known section prefix instead.
fn env_provider() -> Env {
    Env::prefixed("PAGEBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("providers_") {
        for provider in PROVIDERS {
            if let Some(field) = rest
                .strip_prefix(provider)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("providers.{provider}.{field}");
            }
        }
    }
    for section in SECTIONS {
        if let Some(field) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
