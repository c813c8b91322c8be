//! Error types for the orchestration core.
//!
//! # Taxonomy
//! ```text
//! Cause            value attached to a cancelled Context
//!   Canceled         normal termination request (signal or caller)
//!   DeadlineExceeded context deadline passed
//!   Failed           a real failure (e.g. a component's start)
//!
//! ComponentError   one component's start/stop failure (or panic)
//! AggregateError   everything that went wrong in one orchestrator run
//! ```
//!
//! # Design Decisions
//! - Failures never escape as panics; they are merged into one AggregateError
//! - Only the first startup failure is retained; every stop failure is kept
//! - Causes are cheap to clone (Arc) so many readers can observe them

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by component lifecycle routines.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared error stored in a [`Cause`].
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Why a [`Context`](crate::lifecycle::Context) ended.
#[derive(Debug, Clone, Error)]
pub enum Cause {
    /// Normal termination: a signal arrived or the caller cancelled.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A real failure was attached at cancellation time.
    #[error(transparent)]
    Failed(SharedError),
}

impl Cause {
    /// Wrap an error as a failure cause.
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(error))
    }

    /// True for the normal-termination sentinel.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// True when the context ended because its deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

/// Lifecycle routine of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => f.write_str("start"),
            Phase::Stop => f.write_str("stop"),
        }
    }
}

/// Failure of a single component.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("component `{component}` failed to start: {source}")]
    Start {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("component `{component}` failed to stop: {source}")]
    Stop {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("component `{component}` panicked during {phase}: {message}")]
    Panicked {
        component: String,
        phase: Phase,
        message: String,
    },
}

impl ComponentError {
    /// Name of the component that failed.
    pub fn component(&self) -> &str {
        match self {
            Self::Start { component, .. }
            | Self::Stop { component, .. }
            | Self::Panicked { component, .. } => component,
        }
    }

    /// Build a `Panicked` error from a caught panic payload.
    pub(crate) fn panicked(component: &str, phase: Phase, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked {
            component: component.to_string(),
            phase,
            message,
        }
    }
}

/// Returned by a `stop` routine when its context ended before the component did.
#[derive(Debug, Clone, Error)]
#[error("`{component}` did not stop in time: {cause}")]
pub struct StopInterrupted {
    pub component: String,
    #[source]
    pub cause: Cause,
}

impl StopInterrupted {
    pub fn new(component: impl Into<String>, cause: Cause) -> Self {
        Self {
            component: component.into(),
            cause,
        }
    }
}

/// The signal source could not start listening.
#[derive(Debug, Error)]
#[error("failed to listen for termination signals: {0}")]
pub struct SignalRegistrationError(#[source] pub BoxError);

/// Combined outcome of one orchestrator run.
///
/// Holds zero or more causes: the startup cause (when startup did not end
/// normally), every stop failure, and the shutdown context's own terminal cause
/// when the shutdown deadline expired.
#[derive(Debug, Default)]
pub struct AggregateError {
    startup: Option<Cause>,
    shutdown: Vec<ComponentError>,
    shutdown_cause: Option<Cause>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_startup(&mut self, cause: Cause) {
        self.startup = Some(cause);
    }

    pub(crate) fn extend_shutdown(&mut self, failures: impl IntoIterator<Item = ComponentError>) {
        self.shutdown.extend(failures);
    }

    pub(crate) fn set_shutdown_cause(&mut self, cause: Cause) {
        self.shutdown_cause = Some(cause);
    }

    /// Why startup ended abnormally, if it did.
    pub fn startup_failure(&self) -> Option<&Cause> {
        self.startup.as_ref()
    }

    /// Every component that reported a stop failure.
    pub fn shutdown_failures(&self) -> &[ComponentError] {
        &self.shutdown
    }

    /// Terminal cause of the shutdown context (deadline expiry).
    pub fn shutdown_cause(&self) -> Option<&Cause> {
        self.shutdown_cause.as_ref()
    }

    /// True when the shutdown phase hit its deadline.
    pub fn timed_out(&self) -> bool {
        self.shutdown_cause
            .as_ref()
            .is_some_and(Cause::is_deadline_exceeded)
    }

    fn shutdown_failed(&self) -> bool {
        !self.shutdown.is_empty() || self.shutdown_cause.is_some()
    }

    /// All underlying causes in report order.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn std::error::Error + 'static)> {
        self.startup
            .iter()
            .map(|c| c as &(dyn std::error::Error + 'static))
            .chain(
                self.shutdown
                    .iter()
                    .map(|e| e as &(dyn std::error::Error + 'static)),
            )
            .chain(
                self.shutdown_cause
                    .iter()
                    .map(|c| c as &(dyn std::error::Error + 'static)),
            )
    }

    /// Number of underlying causes.
    pub fn len(&self) -> usize {
        usize::from(self.startup.is_some()) + self.shutdown.len() + usize::from(self.shutdown_cause.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Ok(())` when nothing went wrong.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cause) = &self.startup {
            write!(f, "failed to start: {}", cause)?;
        }
        if self.shutdown_failed() {
            if self.startup.is_some() {
                f.write_str("; ")?;
            }
            f.write_str("failed to shutdown gracefully")?;
            let mut sep = ": ";
            for failure in &self.shutdown {
                write!(f, "{}{}", sep, failure)?;
                sep = ", ";
            }
            if let Some(cause) = &self.shutdown_cause {
                write!(f, "{}{}", sep, cause)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes().next()
    }
}
