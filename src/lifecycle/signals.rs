//! Termination-signal sources.
//!
//! # Responsibilities
//! - Turn OS signals (or a programmatic trigger) into context cancellation
//! - Stop listening when the orchestrator releases the guard
//!
//! # Design Decisions
//! - The source is injected, never a process-wide singleton, so the
//!   orchestrator can be driven in tests without real signals
//! - Uses Tokio's signal handling (async-safe)
//! - A received signal cancels with the normal-termination cause

use std::fmt;
use std::str::FromStr;

use futures_util::future::select_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::lifecycle::{CancelHandle, Context};

/// Kinds of termination signal that may request shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
    /// SIGQUIT.
    Quit,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Interrupt => "interrupt",
            SignalKind::Terminate => "terminate",
            SignalKind::Hangup => "hangup",
            SignalKind::Quit => "quit",
        };
        f.write_str(name)
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interrupt" | "int" | "sigint" => Ok(SignalKind::Interrupt),
            "terminate" | "term" | "sigterm" => Ok(SignalKind::Terminate),
            "hangup" | "hup" | "sighup" => Ok(SignalKind::Hangup),
            "quit" | "sigquit" => Ok(SignalKind::Quit),
            other => Err(format!("unknown signal `{}`", other)),
        }
    }
}

/// Produces a context that is cancelled when a termination signal arrives.
pub trait SignalSource: Send + Sync {
    /// Derive a context from `parent` that is cancelled when any of `signals`
    /// arrives. Listening stops when the returned guard is released.
    fn notify(
        &self,
        parent: &Context,
        signals: &[SignalKind],
    ) -> Result<(Context, SignalGuard), BoxError>;
}

/// Keeps a signal listener alive; releasing or dropping it stops listening.
#[derive(Debug)]
pub struct SignalGuard {
    listener: Option<JoinHandle<()>>,
    cancel: CancelHandle,
}

impl SignalGuard {
    fn new(listener: Option<JoinHandle<()>>, cancel: CancelHandle) -> Self {
        Self { listener, cancel }
    }

    /// Stop listening now.
    pub fn release(self) {}
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.cancel.cancel();
    }
}

/// Signals delivered by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

impl SignalSource for OsSignals {
    fn notify(
        &self,
        parent: &Context,
        signals: &[SignalKind],
    ) -> Result<(Context, SignalGuard), BoxError> {
        let (ctx, cancel) = parent.with_cancel();

        let mut streams = Vec::with_capacity(signals.len());
        for kind in signals {
            if streams.iter().any(|s: &SignalStream| s.kind == *kind) {
                continue;
            }
            streams.push(SignalStream::register(*kind)?);
        }

        if streams.is_empty() {
            return Ok((ctx, SignalGuard::new(None, cancel)));
        }

        tracing::debug!(
            signals = ?streams.iter().map(|s| s.kind).collect::<Vec<_>>(),
            "Listening for termination signals"
        );

        let watched = ctx.clone();
        let trigger = cancel.clone();
        let listener = tokio::spawn(async move {
            let received = select_all(streams.iter_mut().map(|s| Box::pin(s.recv())));
            tokio::select! {
                (kind, _, _) = received => {
                    tracing::info!(signal = %kind, "Termination signal received");
                    trigger.cancel();
                }
                _ = watched.done() => {}
            }
        });

        Ok((ctx, SignalGuard::new(Some(listener), cancel)))
    }
}

struct SignalStream {
    kind: SignalKind,
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
}

impl SignalStream {
    #[cfg(unix)]
    fn register(kind: SignalKind) -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind as Unix};

        let unix = match kind {
            SignalKind::Interrupt => Unix::interrupt(),
            SignalKind::Terminate => Unix::terminate(),
            SignalKind::Hangup => Unix::hangup(),
            SignalKind::Quit => Unix::quit(),
        };
        Ok(Self {
            kind,
            inner: signal(unix)?,
        })
    }

    #[cfg(not(unix))]
    fn register(kind: SignalKind) -> std::io::Result<Self> {
        match kind {
            SignalKind::Interrupt => Ok(Self { kind }),
            other => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("signal `{}` is only supported on unix", other),
            )),
        }
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> SignalKind {
        if self.inner.recv().await.is_none() {
            // The stream is gone; never report a signal that did not arrive.
            std::future::pending::<()>().await;
        }
        self.kind
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> SignalKind {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        self.kind
    }
}

/// A signal source triggered from code.
///
/// Useful for tests and for embedding the orchestrator in a host that has its
/// own notion of "time to stop".
#[derive(Debug, Clone, Default)]
pub struct ManualSignals {
    token: CancellationToken,
}

impl ManualSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the termination request. Later `notify` calls see it too.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl SignalSource for ManualSignals {
    fn notify(
        &self,
        parent: &Context,
        _signals: &[SignalKind],
    ) -> Result<(Context, SignalGuard), BoxError> {
        let (ctx, cancel) = parent.with_cancel();
        let token = self.token.clone();
        let watched = ctx.clone();
        let trigger = cancel.clone();
        let listener = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Termination requested");
                    trigger.cancel();
                }
                _ = watched.done() => {}
            }
        });
        Ok((ctx, SignalGuard::new(Some(listener), cancel)))
    }
}
