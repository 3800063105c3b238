//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limits > 0)
//! - Validate addresses and URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::BridgeConfig;

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.broker.url) {
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::new("broker.url", "missing host"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("broker.url", e.to_string())),
    }

    let subject = &config.broker.request_subject;
    if subject.is_empty() {
        errors.push(ValidationError::new("broker.request_subject", "must not be empty"));
    } else if subject.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(
            "broker.request_subject",
            "must not contain whitespace",
        ));
    } else if subject.contains('*') || subject.contains('>') {
        errors.push(ValidationError::new(
            "broker.request_subject",
            "must be a concrete subject, not a wildcard",
        ));
    }

    if config.client.timeout_ms == 0 {
        errors.push(ValidationError::new("client.timeout_ms", "must be greater than 0"));
    }
    if config.client.max_body_bytes == 0 {
        errors.push(ValidationError::new("client.max_body_bytes", "must be greater than 0"));
    }

    if let Some(group) = &config.server.queue_group {
        if group.is_empty() || group.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new(
                "server.queue_group",
                "must be non-empty without whitespace",
            ));
        }
    }

    if config.upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_ms", "must be greater than 0"));
    }
    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be greater than 0"));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be greater than 0"));
    }

    if config.ingress.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("ingress.bind_address", "not a socket address"));
    }
    if !matches!(config.ingress.default_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::new(
            "ingress.default_scheme",
            "must be \"http\" or \"https\"",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
