//! Transport-agnostic serve adapter.
//!
//! Wraps any server that can "serve until this token fires" (hyper, tonic's
//! `serve_with_shutdown`, a hand-written accept loop) as a [`Component`].

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, StopInterrupted};
use crate::lifecycle::{Component, Context};

type ServeFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type ServeFn = Box<dyn FnOnce(CancellationToken) -> ServeFuture + Send>;

/// Error returned when `start` is called a second time.
#[derive(Debug, thiserror::Error)]
#[error("`{0}` has already been started")]
pub struct AlreadyStarted(pub String);

/// A component built from a serve closure.
///
/// `start` runs the closure, handing it a token that fires when `stop` is
/// called. `stop` waits for the closure's future to finish. A `stop` that
/// arrives before `start` has taken the closure drops it, and `start` then
/// returns without serving.
pub struct ServeComponent {
    name: String,
    serve: Mutex<Option<ServeFn>>,
    stop_requested: CancellationToken,
    finished: CancellationToken,
}

impl ServeComponent {
    pub fn new<F, Fut>(name: impl Into<String>, serve: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let serve: ServeFn = Box::new(move |token| Box::pin(serve(token)));
        Self {
            name: name.into(),
            serve: Mutex::new(Some(serve)),
            stop_requested: CancellationToken::new(),
            finished: CancellationToken::new(),
        }
    }

    /// True once the serve future has returned.
    pub fn is_finished(&self) -> bool {
        self.finished.is_cancelled()
    }
}

impl std::fmt::Debug for ServeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeComponent")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[async_trait]
impl Component for ServeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
        let serve = match self.serve.lock().await.take() {
            Some(serve) => serve,
            // `stop` got here first and claimed the closure.
            None if self.stop_requested.is_cancelled() => return Ok(()),
            None => return Err(AlreadyStarted(self.name.clone()).into()),
        };

        let _finished = self.finished.clone().drop_guard();
        serve(self.stop_requested.clone()).await
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        self.stop_requested.cancel();
        if self.serve.lock().await.take().is_some() {
            // Not started yet; a later `start` finds nothing to run.
            return Ok(());
        }
        ctx.wait(self.finished.cancelled())
            .await
            .map_err(|cause| StopInterrupted::new(&self.name, cause))?;
        Ok(())
    }
}
