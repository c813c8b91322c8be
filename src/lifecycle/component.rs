//! The component capability and the ordered set the orchestrator drives.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::lifecycle::Context;

/// A managed unit with a start/stop lifecycle.
///
/// `start` may either run the component's main loop until it ends or return
/// as soon as background work has been spawned; both are supported. A looping
/// `start` should watch `ctx` and return once it is cancelled.
///
/// `stop` asks the component to stop and waits for it, giving up with an error
/// (usually [`StopInterrupted`](crate::error::StopInterrupted)) when `ctx` ends
/// first. A `stop` that ignores `ctx` is abandoned by the orchestrator at the
/// shutdown deadline but keeps running in the background.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Name used in logs, metrics and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Begin the component's work.
    async fn start(&self, ctx: Context) -> Result<(), BoxError>;

    /// Stop the component, bounded by `ctx`.
    async fn stop(&self, ctx: Context) -> Result<(), BoxError>;
}

#[async_trait]
impl<T> Component for Arc<T>
where
    T: Component + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError> {
        (**self).start(ctx).await
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        (**self).stop(ctx).await
    }
}

/// Ordered collection of components that start and stop together.
///
/// Order carries no meaning (everything runs concurrently) but iteration is
/// stable.
#[derive(Clone, Default)]
pub struct ComponentSet {
    pub(crate) components: Vec<Arc<dyn Component>>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, builder style.
    pub fn with(mut self, component: impl Component) -> Self {
        self.push(component);
        self
    }

    pub fn push(&mut self, component: impl Component) {
        self.components.push(Arc::new(component));
    }

    pub fn push_shared(&mut self, component: Arc<dyn Component>) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Component>> {
        self.components.iter()
    }
}

impl std::fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl From<Vec<Arc<dyn Component>>> for ComponentSet {
    fn from(components: Vec<Arc<dyn Component>>) -> Self {
        Self { components }
    }
}

impl FromIterator<Arc<dyn Component>> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Component>>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Component for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _ctx: Context) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct Unnamed;

    #[async_trait]
    impl Component for Unnamed {
        async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _ctx: Context) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let shared: Arc<dyn Component> = Arc::new(Named("shared"));
        let mut set = ComponentSet::new().with(Named("a"));
        set.push(Named("b"));
        set.push_shared(Arc::clone(&shared));

        assert_eq!(set.len(), 3);
        assert_eq!(set.names(), vec!["a", "b", "shared"]);
        assert_eq!(Arc::strong_count(&shared), 2);
    }

    #[test]
    fn default_name_is_the_type_name() {
        let set = ComponentSet::new().with(Unnamed);
        assert!(set.names()[0].ends_with("Unnamed"));
        assert!(ComponentSet::new().is_empty());
    }
}
