// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Pagebot configuration system.

use std::io::Write;

use pagebot_config::diagnostic::ConfigError;
use pagebot_config::model::PagebotConfig;
use pagebot_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_pagebot_config() {
    let toml = r#"
[engine]
log_level = "debug"
max_flow_steps = 12

[server]
bind_address = "0.0.0.0"
port = 8080

[storage]
database_path = "/tmp/pagebot-test.db"
wal_mode = false

[messenger]
verify_token = "hunter2"
app_secret = "shh"

[quota]
business = 20000

[ai]
default_model = "gpt-4o"
timeout_secs = 5

[providers.openai]
api_key = "sk-default"

[providers.anthropic]
api_version = "2024-01-01"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.engine.log_level, "debug");
    assert_eq!(config.engine.max_flow_steps, 12);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.storage.database_path, "/tmp/pagebot-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.messenger.verify_token, "hunter2");
    assert_eq!(config.messenger.app_secret.as_deref(), Some("shh"));
    assert_eq!(config.quota.business, 20000);
    assert_eq!(config.quota.starter, 1000);
    assert_eq!(config.ai.default_model, "gpt-4o");
    assert_eq!(config.ai.timeout_secs, 5);
    assert_eq!(config.ai.history_window, 10);
    assert_eq!(config.providers.openai.api_key.as_deref(), Some("sk-default"));
    assert_eq!(config.providers.anthropic.api_version, "2024-01-01");
    assert_eq!(
        config.providers.gemini.base_url,
        "https://generativelanguage.googleapis.com"
    );
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    let defaults = PagebotConfig::default();
    assert_eq!(config.engine.max_flow_steps, defaults.engine.max_flow_steps);
    assert_eq!(config.ai.default_model, "gemini-3-flash-preview");
    assert_eq!(config.server.port, 3000);
}

#[test]
fn unknown_field_in_ai_section_is_rejected() {
    let toml = r#"
[ai]
histroy_window = 4
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("histroy_window"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let toml = r#"
[messenger]
verfy_token = "abc"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("verify_token"));
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[engine]
max_flow_steps = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero steps is invalid");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn loads_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 4100").unwrap();
    let config = load_and_validate_path(file.path()).expect("file should load");
    assert_eq!(config.server.port, 4100);
}
