//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    let config: BridgeConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_config() {
        let config = parse_config(
            r#"
            [broker]
            url = "nats://broker.internal:4222"

            [client]
            timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.broker.url, "nats://broker.internal:4222");
        assert_eq!(config.client.timeout_ms, 250);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(parse_config("[broker"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = parse_config("[upstream]\nrequest_timeout_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "upstream.request_timeout_secs");
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = parse_config("[client]\ntimeout_ms = 0\n").unwrap_err().to_string();
        assert!(message.starts_with("Validation failed: client.timeout_ms"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
