//! Bounded shutdown fan-out.
//!
//! # Responsibilities
//! - Build a fresh shutdown context (never derived from the cancelled startup one)
//! - Call every component's `stop` concurrently against it
//! - Join all stop tasks and collect every failure
//!
//! # Design Decisions
//! - No short-circuit: one failed stop never hides another
//! - Failures are appended under a mutex by the stop tasks themselves
//! - At the deadline, stops that return within a short grace window are still
//!   collected; the rest are detached (not aborted) and reported through the
//!   deadline cause

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{Cause, ComponentError, Phase};
use crate::lifecycle::{Component, Context};
use crate::observability::metrics;

/// How long stops that honour the deadline get to return once it has passed.
const DEADLINE_GRACE: Duration = Duration::from_millis(25);

/// What the shutdown phase observed.
#[derive(Debug, Default)]
pub(crate) struct ShutdownReport {
    pub failures: Vec<ComponentError>,
    pub cause: Option<Cause>,
}

/// Stop every component, bounded by `timeout` when one is given.
pub(crate) async fn fan_out(
    components: &[Arc<dyn Component>],
    timeout: Option<Duration>,
) -> ShutdownReport {
    let background = Context::background();
    let (ctx, cancel) = match timeout {
        Some(timeout) => background.with_timeout(timeout),
        None => background.with_cancel(),
    };
    let _release = cancel.guard();

    let failures: Arc<Mutex<Vec<ComponentError>>> = Arc::default();
    let mut stops = JoinSet::new();

    for component in components {
        let component = Arc::clone(component);
        let ctx = ctx.clone();
        let failures = Arc::clone(&failures);

        stops.spawn(async move {
            let name = component.name().to_string();
            debug!(component = %name, "Stopping component");

            let failure = match AssertUnwindSafe(component.stop(ctx)).catch_unwind().await {
                Ok(Ok(())) => {
                    debug!(component = %name, "Component stopped");
                    return;
                }
                Ok(Err(source)) => ComponentError::Stop {
                    component: name.clone(),
                    source,
                },
                Err(payload) => ComponentError::panicked(&name, Phase::Stop, payload.as_ref()),
            };

            error!(component = %name, error = %failure, "Component failed to stop");
            metrics::record_stop_failure(&name);
            failures.lock().await.push(failure);
        });
    }

    loop {
        tokio::select! {
            biased;
            joined = stops.join_next() => match joined {
                Some(Ok(())) => {}
                Some(Err(err)) => warn!(error = %err, "Stop task ended abnormally"),
                None => break,
            },
            _ = ctx.done() => {
                metrics::record_shutdown_timeout();
                // Stops woken by this same deadline still get to report.
                let drained = tokio::time::timeout(DEADLINE_GRACE, async {
                    while stops.join_next().await.is_some() {}
                })
                .await;
                if drained.is_err() {
                    warn!(
                        pending = stops.len(),
                        "Shutdown deadline exceeded; abandoning components still stopping"
                    );
                    stops.detach_all();
                }
                break;
            }
        }
    }

    // Read before the guard cancels the context on return.
    let cause = ctx.cause();
    let failures = std::mem::take(&mut *failures.lock().await);

    ShutdownReport { failures, cause }
}
