//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes in range)
//! - Reject subjects and header names the runtime could not use
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs once at startup, before the config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};

use crate::config::schema::GatewayConfig;

/// A single rejected setting.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `bus.reply_timeout_ms`.
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a resolved configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "listener.max_body_bytes",
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.bus.url.trim().is_empty() {
        errors.push(ValidationError {
            field: "bus.url",
            reason: "must not be empty".to_string(),
        });
    }

    if config.bus.reply_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "bus.reply_timeout_ms",
            reason: "must be greater than zero".to_string(),
        });
    }

    check_status(&mut errors, "response.head_status", config.response.head_status);
    check_status(&mut errors, "response.get_status", config.response.get_status);
    check_status(&mut errors, "response.put_status", config.response.put_status);
    check_status(&mut errors, "response.post_status", config.response.post_status);
    check_status(&mut errors, "response.patch_status", config.response.patch_status);
    check_status(&mut errors, "response.delete_status", config.response.delete_status);

    if HeaderValue::from_str(&config.response.content_type).is_err() {
        errors.push(ValidationError {
            field: "response.content_type",
            reason: "not a valid header value".to_string(),
        });
    }

    check_publish_subject(
        &mut errors,
        "observability.metrics_subject",
        &config.observability.metrics_subject,
    );
    check_publish_subject(
        &mut errors,
        "observability.logs_subject",
        &config.observability.logs_subject,
    );

    let trace_header = &config.observability.trace_header;
    if !trace_header.is_empty() && HeaderName::from_bytes(trace_header.as_bytes()).is_err() {
        errors.push(ValidationError {
            field: "observability.trace_header",
            reason: "not a valid header name".to_string(),
        });
    }

    if config.observability.prometheus_enabled
        && config.observability.prometheus_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.prometheus_address",
            reason: "not a valid socket address".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_status(errors: &mut Vec<ValidationError>, field: &'static str, status: u16) {
    if !(100..=599).contains(&status) {
        errors.push(ValidationError {
            field,
            reason: format!("{status} is not a valid HTTP status code"),
        });
    }
}

/// Empty subjects disable the channel, so only non-empty values are checked.
fn check_publish_subject(errors: &mut Vec<ValidationError>, field: &'static str, subject: &str) {
    if subject.is_empty() {
        return;
    }
    if subject.chars().any(|c| c.is_whitespace()) {
        errors.push(ValidationError {
            field,
            reason: "must not contain whitespace".to_string(),
        });
        return;
    }
    if subject.contains('*') || subject.contains('>') {
        errors.push(ValidationError {
            field,
            reason: "wildcards are not allowed in publish subjects".to_string(),
        });
        return;
    }
    if subject.split('.').any(|token| token.is_empty()) {
        errors.push(ValidationError {
            field,
            reason: "subject tokens must not be empty".to_string(),
        });
    }
}
