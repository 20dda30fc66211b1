//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Check that enabled features carry the settings they need
//!
//! Returns every violation, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, ClientInfo};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.startup.interval_secs == 0 {
        errors.push(ValidationError::new(
            "startup.interval_secs",
            "must be greater than zero",
        ));
    }

    let mut names: Vec<&String> = config.clients.keys().collect();
    names.sort();
    for name in names {
        validate_client(name, &config.clients[name], &mut errors);
    }

    if config.writable.store_and_forward.enabled {
        let db = &config.database;
        if db.db_type.is_empty() {
            errors.push(ValidationError::new("database.type", "must not be empty"));
        }
        if db.db_type != "memory" {
            if db.host.is_empty() {
                errors.push(ValidationError::new("database.host", "must not be empty"));
            }
            if db.port == 0 {
                errors.push(ValidationError::new("database.port", "must be greater than zero"));
            }
        }
    }

    for (name, entry) in &config.writable.insecure_secrets {
        if entry.path.is_empty() {
            errors.push(ValidationError::new(
                format!("writable.insecure_secrets.{name}.path"),
                "must not be empty",
            ));
        }
    }

    if config.telemetry.interval_secs == 0 {
        errors.push(ValidationError::new(
            "telemetry.interval_secs",
            "must be greater than zero",
        ));
    }

    if config.telemetry.metrics_enabled
        && config.telemetry.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "telemetry.metrics_address",
            format!("'{}' is not a socket address", config.telemetry.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_client(name: &str, client: &ClientInfo, errors: &mut Vec<ValidationError>) {
    if client.host.is_empty() {
        errors.push(ValidationError::new(
            format!("clients.{name}.host"),
            "must not be empty",
        ));
    }
    if client.port == 0 {
        errors.push(ValidationError::new(
            format!("clients.{name}.port"),
            "must be greater than zero",
        ));
    }
    if client.protocol != "http" && client.protocol != "https" {
        errors.push(ValidationError::new(
            format!("clients.{name}.protocol"),
            format!("unsupported protocol '{}'", client.protocol),
        ));
    }
}
