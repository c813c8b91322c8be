//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//! - Detect duplicates (signals, component names)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("signal `{0}` is listed more than once")]
    DuplicateSignal(String),

    #[error("invalid {field} `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("http.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("ticker `{0}` must have interval_ms greater than 0")]
    ZeroTickerInterval(String),

    #[error("component name `{0}` is used more than once")]
    DuplicateComponent(String),

    #[error("invalid log level `{0}`")]
    InvalidLogLevel(String),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for signal in &config.graceful.signals {
        if !seen.insert(*signal) {
            errors.push(ValidationError::DuplicateSignal(signal.to_string()));
        }
    }

    if config.http.enabled {
        if config.http.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "http.bind_address",
                value: config.http.bind_address.clone(),
            });
        }
        if config.http.request_timeout_secs == 0 {
            errors.push(ValidationError::ZeroRequestTimeout);
        }
    }

    let mut names = HashSet::new();
    if config.http.enabled {
        names.insert("http");
    }
    for ticker in &config.tickers {
        if ticker.interval_ms == 0 {
            errors.push(ValidationError::ZeroTickerInterval(ticker.name.clone()));
        }
        if !names.insert(ticker.name.as_str()) {
            errors.push(ValidationError::DuplicateComponent(ticker.name.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }
    if EnvFilter::try_new(&observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
