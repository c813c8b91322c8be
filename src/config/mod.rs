//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → GracefulConfig handed to ComponentSet::graceful
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - GracefulConfig is a plain value; no shared mutable defaults

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, GracefulConfig, HttpConfig, LogFormat, ObservabilityConfig, TickerConfig,
};
pub use validation::{validate_config, ValidationError};
