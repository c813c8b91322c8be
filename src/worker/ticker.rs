//! Periodic worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::TickerConfig;
use crate::error::{BoxError, StopInterrupted};
use crate::lifecycle::{Component, Context};

/// How `start` runs the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerMode {
    Spawned,
    Blocking,
}

/// A worker that does one unit of work per interval.
#[derive(Debug)]
pub struct Ticker {
    name: String,
    interval: Duration,
    mode: TickerMode,
    ticks: Arc<AtomicU64>,
    stop_requested: CancellationToken,
    stopped: CancellationToken,
}

impl Ticker {
    pub fn new(name: impl Into<String>, interval: Duration, mode: TickerMode) -> Self {
        Self {
            name: name.into(),
            interval,
            mode,
            ticks: Arc::new(AtomicU64::new(0)),
            stop_requested: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &TickerConfig) -> Self {
        let mode = if config.blocking {
            TickerMode::Blocking
        } else {
            TickerMode::Spawned
        };
        Self::new(config.name.clone(), Duration::from_millis(config.interval_ms), mode)
    }

    /// Number of completed iterations.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> TickerMode {
        self.mode
    }

    fn work_loop(&self, ctx: Context) -> impl std::future::Future<Output = ()> + Send + 'static {
        let name = self.name.clone();
        let period = self.interval;
        let ticks = Arc::clone(&self.ticks);
        let stop_requested = self.stop_requested.clone();
        let stopped = self.stopped.clone();

        async move {
            let _stopped = stopped.drop_guard();
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_requested.cancelled() => {
                        tracing::debug!(component = %name, "Stop requested");
                        break;
                    }
                    _ = ctx.done() => {
                        tracing::debug!(component = %name, "Context cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(component = %name, tick = n, "Working");
                    }
                }
            }

            tracing::info!(component = %name, ticks = ticks.load(Ordering::Relaxed), "Ticker done");
        }
    }
}

#[async_trait]
impl Component for Ticker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError> {
        tracing::info!(component = %self.name, mode = ?self.mode, interval_ms = self.interval.as_millis() as u64, "Ticker starting");
        match self.mode {
            TickerMode::Spawned => {
                tokio::spawn(self.work_loop(ctx));
            }
            TickerMode::Blocking => self.work_loop(ctx).await,
        }
        Ok(())
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        self.stop_requested.cancel();
        ctx.wait(self.stopped.cancelled())
            .await
            .map_err(|cause| StopInterrupted::new(&self.name, cause))?;
        Ok(())
    }
}
