// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::PlexusConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &PlexusConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.host.name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "host.name must not be empty".to_string(),
        });
    }

    let address = &config.host.address;
    if address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "host.address must not be empty".to_string(),
        });
    } else if address.chars().any(char::is_whitespace) {
        errors.push(ConfigError::Validation {
            message: format!("host.address `{address}` must not contain whitespace"),
        });
    }

    if !LOG_LEVELS.contains(&config.host.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "host.log_level `{}` is not one of {}",
                config.host.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
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

    fn messages(config: &PlexusConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&PlexusConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PlexusConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn address_with_whitespace_fails_validation() {
        let mut config = PlexusConfig::default();
        config.host.address = "my host".to_string();
        assert!(messages(&config)[0].contains("whitespace"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = PlexusConfig::default();
        config.host.log_level = "verbose".to_string();
        assert!(messages(&config)[0].contains("log_level"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = PlexusConfig::default();
        config.host.name = String::new();
        config.host.address = String::new();
        config.storage.database_path = String::new();
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }
}
