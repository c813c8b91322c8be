//! Graceful start/stop orchestration for multi-component services.
//!
//! A [`ComponentSet`] starts every [`Component`] concurrently, waits for a
//! termination signal, caller cancellation or the first start failure, then
//! stops every component concurrently under an optional deadline and returns
//! one [`AggregateError`] describing anything that went wrong.
//!
//! ```no_run
//! use std::time::Duration;
//! use graceful::{ComponentSet, Context, GracefulConfig, HttpServer, Ticker, TickerMode};
//!
//! # async fn run() -> Result<(), graceful::AggregateError> {
//! let components = ComponentSet::new()
//!     .with(HttpServer::new("127.0.0.1:8000", axum::Router::new()))
//!     .with(Ticker::new("ticker", Duration::from_secs(1), TickerMode::Spawned));
//!
//! let config = GracefulConfig::default().with_shutdown_timeout(Duration::from_secs(1));
//! components.graceful(&Context::background(), &config).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod worker;

pub use config::GracefulConfig;
pub use error::{AggregateError, BoxError, Cause, ComponentError, StopInterrupted};
pub use http::{listen_and_serve, HttpServer};
pub use lifecycle::{
    CancelHandle, Component, ComponentSet, Context, ManualSignals, OsSignals, SignalKind,
    SignalSource,
};
pub use net::ServeComponent;
pub use worker::{Ticker, TickerMode};
