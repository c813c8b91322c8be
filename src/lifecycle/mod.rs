//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! graceful(ctx, config):
//!     signals.rs   ctx → signal context (cancelled on SIGINT/SIGTERM/...)
//!     startup.rs   start all components → wait for signal, caller or first failure
//!     shutdown.rs  fresh bounded context → stop all components → join
//!     mod.rs       merge startup cause + stop failures + deadline → one result
//! ```
//!
//! # States (per call)
//! ```text
//! Idle → Starting → (Running | StartFailed) → ShuttingDown → Done
//! ```
//! Both `Running` and `StartFailed` always go on to `ShuttingDown`.
//!
//! # Design Decisions
//! - Everything starts and stops concurrently; only the phases are ordered
//! - No `stop` runs before the startup phase has resolved
//! - Cancellation is cooperative; nothing is forcibly aborted

pub mod component;
pub mod context;
pub mod shutdown;
pub mod signals;
pub mod startup;

use std::time::Instant;

use tracing::{error, info};

pub use component::{Component, ComponentSet};
pub use context::{CancelGuard, CancelHandle, Context};
pub use signals::{ManualSignals, OsSignals, SignalGuard, SignalKind, SignalSource};

use crate::config::GracefulConfig;
use crate::error::{AggregateError, Cause, SignalRegistrationError};
use crate::observability::metrics;

impl ComponentSet {
    /// Run all components until a termination signal (per `config.signals`)
    /// arrives, `ctx` is cancelled, or a component fails to start; then stop
    /// them all.
    pub async fn graceful(
        &self,
        ctx: &Context,
        config: &GracefulConfig,
    ) -> Result<(), AggregateError> {
        self.graceful_with(ctx, config, &OsSignals).await
    }

    /// Like [`graceful`](Self::graceful) with an injected signal source.
    pub async fn graceful_with<S>(
        &self,
        ctx: &Context,
        config: &GracefulConfig,
        signals: &S,
    ) -> Result<(), AggregateError>
    where
        S: SignalSource + ?Sized,
    {
        let mut report = AggregateError::new();

        let (signal_ctx, _signal_guard) = match signals.notify(ctx, &config.signals) {
            Ok(pair) => pair,
            Err(err) => {
                let err = SignalRegistrationError(err);
                error!(error = %err, "Cannot start components");
                report.set_startup(Cause::failed(err));
                return report.into_result();
            }
        };

        info!(
            components = self.len(),
            state = "starting",
            "Starting components"
        );
        match startup::race(&self.components, &signal_ctx).await {
            None => info!(state = "running", "Termination requested"),
            Some(cause) => {
                error!(state = "start_failed", error = %cause, "Startup failed");
                report.set_startup(cause);
            }
        }

        let timeout = config.shutdown_timeout();
        info!(
            state = "shutting_down",
            timeout_ms = timeout.map(|t| t.as_millis() as u64),
            "Stopping components"
        );
        let started = Instant::now();
        let shutdown = shutdown::fan_out(&self.components, timeout).await;
        let elapsed = started.elapsed();

        report.extend_shutdown(shutdown.failures);
        if let Some(cause) = shutdown.cause {
            report.set_shutdown_cause(cause);
        }

        let outcome = if report.is_empty() { "ok" } else { "error" };
        metrics::record_shutdown(elapsed, outcome);
        info!(
            state = "done",
            outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "Shutdown complete"
        );

        report.into_result()
    }
}
