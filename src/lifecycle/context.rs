//! Cancellable, cause-carrying execution context.
//!
//! # Responsibilities
//! - Propagate cancellation from parent to child contexts
//! - Record the cause of the first cancellation (set-once)
//! - Enforce an optional deadline without background tasks
//!
//! # Design Decisions
//! - Cancellation rides on `tokio_util`'s `CancellationToken` tree
//! - The cause lives in a `OnceLock`; later cancellations lose the race
//! - Deadlines are observed lazily by `done()` / `cause()`, so a context
//!   owns no timers or tasks and cannot leak past its owner

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Cause;

#[derive(Debug)]
struct Inner {
    token: CancellationToken,
    cause: OnceLock<Cause>,
    deadline: Option<Instant>,
    parent: Option<Arc<Inner>>,
}

impl Inner {
    fn root() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: OnceLock::new(),
            deadline: None,
            parent: None,
        }
    }

    fn cause(&self) -> Option<Cause> {
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        if self.token.is_cancelled() {
            // Cancelled through the parent: inherit its cause.
            let inherited = self
                .parent
                .as_ref()
                .and_then(|parent| parent.cause())
                .unwrap_or(Cause::Canceled);
            return Some(self.settle(inherited));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(self.settle(Cause::DeadlineExceeded));
        }
        None
    }

    fn settle(&self, cause: Cause) -> Cause {
        let settled = self.cause.get_or_init(|| cause).clone();
        self.token.cancel();
        settled
    }
}

/// Execution context handed to components.
///
/// Cloning is cheap; every clone observes the same cancellation.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner::root()),
        }
    }

    /// Derive a child that can be cancelled independently.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        self.derive(None)
    }

    /// Derive a child that is also done after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelHandle) {
        self.derive(Some(Instant::now() + timeout))
    }

    /// Derive a child that is also done at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> (Context, CancelHandle) {
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> (Context, CancelHandle) {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        let inner = Arc::new(Inner {
            token: self.inner.token.child_token(),
            cause: OnceLock::new(),
            deadline,
            parent: Some(Arc::clone(&self.inner)),
        });
        (
            Context {
                inner: Arc::clone(&inner),
            },
            CancelHandle { inner },
        )
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        self.inner.settle(Cause::DeadlineExceeded);
                    }
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    /// Why the context ended, or `None` while it is still live.
    pub fn cause(&self) -> Option<Cause> {
        self.inner.cause()
    }

    pub fn is_done(&self) -> bool {
        self.cause().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Drive `fut` to completion unless the context ends first.
    pub async fn wait<F>(&self, fut: F) -> Result<F::Output, Cause>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            output = fut => Ok(output),
            _ = self.done() => Err(self.cause().unwrap_or(Cause::Canceled)),
        }
    }
}

/// Cancels the context it was derived with.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    inner: Arc<Inner>,
}

impl CancelHandle {
    /// Cancel with the normal-termination cause.
    pub fn cancel(&self) {
        self.cancel_with(Cause::Canceled);
    }

    /// Cancel with `cause`.
    ///
    /// Returns `true` if `cause` became the context's cause, `false` when the
    /// context had already ended for another reason.
    pub fn cancel_with(&self, cause: Cause) -> bool {
        if self.inner.cause().is_some() {
            return false;
        }
        let retained = self.inner.cause.set(cause).is_ok();
        self.inner.token.cancel();
        retained
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Cancel automatically when the returned guard is dropped.
    pub fn guard(self) -> CancelGuard {
        CancelGuard { handle: self }
    }
}

/// Cancels its context on drop.
#[derive(Debug)]
pub struct CancelGuard {
    handle: CancelHandle,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
