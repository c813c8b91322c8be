//! HTTP listener adapter.
//!
//! # Responsibilities
//! - Wrap an Axum Router as a lifecycle Component
//! - `start`: bind the listener and serve until a stop is requested
//! - `stop`: trigger graceful shutdown, wait for in-flight requests to drain
//! - Wire up middleware (tracing, request timeout)
//!
//! # Design Decisions
//! - Serving ignores startup cancellation; connections drain during `stop`
//! - A bind failure is a start error (and so triggers orchestrated shutdown)
//! - Hitting the stop deadline is reported as `StopInterrupted`

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GracefulConfig, HttpConfig};
use crate::error::{AggregateError, BoxError, StopInterrupted};
use crate::lifecycle::{Component, ComponentSet, Context};
use crate::net::listener;

/// HTTP server managed by the orchestrator.
pub struct HttpServer {
    name: String,
    bind_address: String,
    router: Router,
    stop_requested: CancellationToken,
    finished: CancellationToken,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Serve `router` on `bind_address` (e.g., "0.0.0.0:8000").
    pub fn new(bind_address: impl Into<String>, router: Router) -> Self {
        Self {
            name: "http".to_string(),
            bind_address: bind_address.into(),
            router,
            stop_requested: CancellationToken::new(),
            finished: CancellationToken::new(),
            local_addr: OnceLock::new(),
        }
    }

    /// Build from configuration, adding the standard middleware layers.
    #[allow(deprecated)]
    pub fn from_config(config: &HttpConfig, router: Router) -> Self {
        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http());
        Self::new(config.bind_address.clone(), router)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Address the listener is bound to, once `start` has bound it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }
}

#[async_trait]
impl Component for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
        let _finished = self.finished.clone().drop_guard();

        let listener = listener::bind(&self.bind_address).await?;
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);

        tracing::info!(
            component = %self.name,
            address = %addr,
            "HTTP server starting"
        );

        let stop_requested = self.stop_requested.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { stop_requested.cancelled().await })
            .await?;

        tracing::info!(component = %self.name, "HTTP server stopped");
        Ok(())
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        tracing::info!(component = %self.name, "HTTP server draining connections");
        self.stop_requested.cancel();

        ctx.wait(self.finished.cancelled())
            .await
            .map_err(|cause| StopInterrupted::new(&self.name, cause))?;
        Ok(())
    }
}

/// Serve `router` on `address` until a termination signal arrives or `ctx`
/// is cancelled, then shut down gracefully.
pub async fn listen_and_serve(
    ctx: &Context,
    address: impl Into<String>,
    router: Router,
    config: &GracefulConfig,
) -> Result<(), AggregateError> {
    ComponentSet::new()
        .with(HttpServer::new(address, router))
        .graceful(ctx, config)
        .await
}
