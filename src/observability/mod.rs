//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle (startup race, shutdown fan-out, adapters) produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; the binary installs subscribers/recorders
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
