//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! rules. Every problem is reported, not just the first.

use std::net::SocketAddr;

use axum::http::Method;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// Largest accepted body chunk.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
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

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.images.dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("images.dir", "must not be empty"));
    }

    if config.images.chunk_size == 0 || config.images.chunk_size > MAX_CHUNK_SIZE {
        errors.push(ValidationError::new(
            "images.chunk_size",
            format!("must be between 1 and {MAX_CHUNK_SIZE} bytes"),
        ));
    }

    if config.cors.allowed_methods.is_empty() {
        errors.push(ValidationError::new("cors.allowed_methods", "must not be empty"));
    }
    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("'{method}' is not an HTTP method"),
            ));
        }
    }

    let origins = &config.cors.allowed_origins;
    if origins.is_empty() {
        errors.push(ValidationError::new("cors.allowed_origins", "must not be empty"));
    } else if origins.len() > 1 && origins.iter().any(|o| o == "*") {
        errors.push(ValidationError::new(
            "cors.allowed_origins",
            "'*' cannot be combined with explicit origins",
        ));
    }
    for origin in origins {
        if axum::http::HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{origin}' is not a valid header value"),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::new("observability.log_level", e.to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
