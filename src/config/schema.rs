//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::SignalKind;

/// Orchestrator options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GracefulConfig {
    /// Signals that request shutdown (default: interrupt only).
    pub signals: Vec<SignalKind>,

    /// Bound on the shutdown phase in milliseconds. 0 means no bound.
    pub shutdown_timeout_ms: u64,
}

impl Default for GracefulConfig {
    fn default() -> Self {
        Self {
            signals: vec![SignalKind::Interrupt],
            shutdown_timeout_ms: 0,
        }
    }
}

impl GracefulConfig {
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = SignalKind>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        // Round up so a sub-millisecond bound never turns into "unbounded".
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.shutdown_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// The shutdown bound, or `None` when shutdown is unbounded.
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        (self.shutdown_timeout_ms > 0).then(|| Duration::from_millis(self.shutdown_timeout_ms))
    }
}

/// Root configuration for the demo service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orchestrator settings.
    pub graceful: GracefulConfig,

    /// HTTP listener settings.
    pub http: HttpConfig,

    /// Background tickers to run next to the listener.
    pub tickers: Vec<TickerConfig>,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graceful: GracefulConfig::default(),
            http: HttpConfig::default(),
            tickers: vec![
                TickerConfig {
                    name: "ticker".to_string(),
                    interval_ms: 1_000,
                    blocking: false,
                },
                TickerConfig {
                    name: "blocking-ticker".to_string(),
                    interval_ms: 1_000,
                    blocking: true,
                },
            ],
            observability: ObservabilityConfig::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Run the HTTP listener.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// A periodic background worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickerConfig {
    /// Component name (unique).
    pub name: String,

    /// Tick interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Run the loop inside `start` instead of spawning it.
    #[serde(default)]
    pub blocking: bool,
}

fn default_interval_ms() -> u64 {
    1_000
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Default log level / filter directive.
    pub log_level: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
