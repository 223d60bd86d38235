// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and positive bounds.

use crate::diagnostic::ConfigError;
use crate::model::PagebotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PagebotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.engine.max_flow_steps == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.max_flow_steps must be at least 1".to_string(),
        });
    }

    if config.messenger.verify_token.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "messenger.verify_token must not be empty".to_string(),
        });
    }

    for (name, ceiling) in [
        ("starter", config.quota.starter),
        ("business", config.quota.business),
        ("pro", config.quota.pro),
        ("unknown", config.quota.unknown),
    ] {
        if ceiling < 0 {
            errors.push(ConfigError::Validation {
                message: format!("quota.{name} must be non-negative, got {ceiling}"),
            });
        }
    }

    if config.ai.default_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ai.default_model must not be empty".to_string(),
        });
    }

    if config.ai.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "ai.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.ai.max_output_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "ai.max_output_tokens must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = PagebotConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PagebotConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("database_path"));
    }

    #[test]
    fn bad_bind_address_fails_validation() {
        let mut config = PagebotConfig::default();
        config.server.bind_address = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("bind_address"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = PagebotConfig::default();
        config.engine.max_flow_steps = 0;
        config.ai.timeout_secs = 0;
        config.quota.pro = -1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
