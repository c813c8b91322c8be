//! Startup race.
//!
//! # Responsibilities
//! - Launch every component's `start` as its own task under one shared context
//! - Cancel that context with the first start failure as its cause
//! - Resolve once the context is done (signal, caller, or failure)
//!
//! # Design Decisions
//! - First failure wins; later concurrent failures are logged and dropped
//! - Start tasks are never awaited or aborted: a blocking `start` is expected
//!   to return on its own once cancelled or stopped
//! - A panicking `start` counts as a start failure

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::error::{Cause, ComponentError, Phase, SharedError};
use crate::lifecycle::{Component, Context};
use crate::observability::metrics;

/// Start every component and wait for the startup phase to resolve.
///
/// Returns `None` when startup ended normally (termination requested) and the
/// abnormal cause otherwise.
pub(crate) async fn race(components: &[Arc<dyn Component>], parent: &Context) -> Option<Cause> {
    let (ctx, cancel) = parent.with_cancel();
    let _release = cancel.clone().guard();

    for component in components {
        let component = Arc::clone(component);
        let ctx = ctx.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let name = component.name().to_string();
            debug!(component = %name, "Starting component");

            let failure = match AssertUnwindSafe(component.start(ctx)).catch_unwind().await {
                Ok(Ok(())) => {
                    debug!(component = %name, "Component start returned");
                    return;
                }
                Ok(Err(source)) => ComponentError::Start {
                    component: name.clone(),
                    source,
                },
                Err(payload) => ComponentError::panicked(&name, Phase::Start, payload.as_ref()),
            };

            metrics::record_start_failure(&name);
            let failure: SharedError = Arc::new(failure);
            if cancel.cancel_with(Cause::Failed(Arc::clone(&failure))) {
                error!(component = %name, error = %failure, "Component failed to start");
            } else {
                warn!(
                    component = %name,
                    error = %failure,
                    "Component failed to start after startup had already resolved"
                );
            }
        });
    }

    ctx.done().await;

    match ctx.cause() {
        Some(Cause::Canceled) | None => None,
        Some(cause) => Some(cause),
    }
}
