//! Conditional Hook - Execute hooks based on conditions.

use keel_core::{BoxError, Hook, Message, Next};

/// A hook that only runs its inner hook for matching events.
///
/// When the condition is `false`, the chain continues as if the hook was not
/// registered.
///
/// # Example
///
/// ```rust,ignore
/// use keel_std::hooks::ConditionalHook;
///
/// // Only guard system collections
/// let guard = ConditionalHook::new(
///     |event: &ModelEvent<Collection>| event.model.system,
///     RejectSystemChanges,
/// );
/// hooks.collection_before_delete().register(guard)?;
/// ```
pub struct ConditionalHook<C, H> {
    condition: C,
    inner: H,
}

impl<C, H> ConditionalHook<C, H> {
    /// Create a new `ConditionalHook`.
    ///
    /// The inner hook will only be executed when `condition(event)` returns `true`.
    pub fn new(condition: C, inner: H) -> Self {
        Self { condition, inner }
    }
}

impl<E, C, H> Hook<E> for ConditionalHook<C, H>
where
    E: Message,
    C: Fn(&E) -> bool + Send + Sync + 'static,
    H: Hook<E>,
{
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), BoxError> {
        if (self.condition)(&*event) {
            self.inner.handle(event, next).await
        } else {
            next.run(event).await
        }
    }
}
