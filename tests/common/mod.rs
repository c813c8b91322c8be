//! Shared utilities for orchestrator integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use graceful::error::{BoxError, ComponentError, StopInterrupted};
use graceful::{AggregateError, Cause, Component, Context};

/// How a [`Probe`] behaves when started.
#[derive(Debug, Clone)]
pub enum OnStart {
    /// Return `Ok` right away (work "spawned" elsewhere).
    Return,
    /// Block until the start context is done.
    RunUntilCancelled,
    /// Fail after the given delay.
    Fail(Duration),
    Panic,
}

/// How a [`Probe`] behaves when stopped.
#[derive(Debug, Clone)]
pub enum OnStop {
    Return,
    Fail,
    /// Ignore the context and never return.
    Hang,
    /// Never finish on its own but give up when the context ends.
    UntilDeadline,
    Panic,
}

/// Lifecycle event recorded by probes, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    StartFailed(String),
    Stopped(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

#[derive(Debug, thiserror::Error)]
#[error("{0} exploded")]
pub struct Boom(pub String);

/// Scriptable test component.
pub struct Probe {
    name: String,
    on_start: OnStart,
    on_stop: OnStop,
    starts: AtomicUsize,
    stops: AtomicUsize,
    events: EventLog,
}

impl Probe {
    pub fn new(name: &str, on_start: OnStart, on_stop: OnStop) -> Arc<Self> {
        Self::with_log(name, on_start, on_stop, EventLog::default())
    }

    pub fn with_log(name: &str, on_start: OnStart, on_stop: OnStop, events: EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            on_start,
            on_stop,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            events,
        })
    }

    /// Start blocks until cancelled, stop succeeds.
    pub fn well_behaved(name: &str) -> Arc<Self> {
        Self::new(name, OnStart::RunUntilCancelled, OnStop::Return)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn record(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl Component for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.record(Event::Started(self.name.clone()));
        match self.on_start {
            OnStart::Return => Ok(()),
            OnStart::RunUntilCancelled => {
                ctx.done().await;
                Ok(())
            }
            OnStart::Fail(delay) => {
                tokio::time::sleep(delay).await;
                self.record(Event::StartFailed(self.name.clone()));
                Err(Boom(self.name.clone()).into())
            }
            OnStart::Panic => panic!("{} panicked while starting", self.name),
        }
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.record(Event::Stopped(self.name.clone()));
        match self.on_stop {
            OnStop::Return => Ok(()),
            OnStop::Fail => Err(Boom(self.name.clone()).into()),
            OnStop::Hang => std::future::pending().await,
            OnStop::UntilDeadline => {
                ctx.wait(std::future::pending::<()>())
                    .await
                    .map_err(|cause| StopInterrupted::new(&self.name, cause))?;
                Ok(())
            }
            OnStop::Panic => panic!("{} panicked while stopping", self.name),
        }
    }
}

/// The component error retained as the startup cause, if any.
pub fn startup_component_error(err: &AggregateError) -> Option<&ComponentError> {
    match err.startup_failure()? {
        Cause::Failed(source) => source.downcast_ref::<ComponentError>(),
        _ => None,
    }
}

/// Names of components whose stop failed, sorted.
pub fn stop_failure_names(err: &AggregateError) -> Vec<String> {
    let mut names: Vec<String> = err
        .shutdown_failures()
        .iter()
        .map(|f| f.component().to_string())
        .collect();
    names.sort();
    names
}

/// Wait for a future with a generous upper bound so a hang fails the test
/// instead of stalling the suite.
pub async fn bounded<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation did not finish within 5s")
}
