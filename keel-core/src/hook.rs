//! # Hook Layer
//!
//! The unit of pluggable behavior around an operation.
//!
//! A hook receives the event and the continuation of the chain. What it does
//! with the continuation decides the operation:
//!
//! - call `next` and return its result: pass-through (observation)
//! - call `next` and inspect or rewrite the result: post-processing
//! - return without calling `next`: short-circuit; nothing inside runs,
//!   including the terminal action
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Hook`] uses native `async fn` for zero-cost static dispatch.
//! Registries store hooks as [`DynHook`] trait objects; every `Hook` is a
//! `DynHook` through the blanket implementation.

use crate::{chain::Next, error::BoxError, message::Message};
use futures::future::BoxFuture;
use std::future::Future;

/// One layer of an interceptor chain.
///
/// # Example
///
/// ```rust
/// use keel_core::{BoxError, Hook, Next};
///
/// struct Signup {
///     email: String,
/// }
///
/// struct NormalizeEmail;
///
/// impl Hook<Signup> for NormalizeEmail {
///     async fn handle(&self, event: &mut Signup, next: Next<'_, Signup>) -> Result<(), BoxError> {
///         event.email = event.email.trim().to_lowercase();
///         next.run(event).await
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Hook<{E}>`",
    label = "missing `Hook` implementation",
    note = "Hooks must implement `handle` for the specific event type `{E}`."
)]
pub trait Hook<E: Message>: Send + Sync + 'static {
    /// Handle the event; call `next.run(event)` to continue the chain.
    fn handle(
        &self,
        event: &mut E,
        next: Next<'_, E>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`Hook`].
///
/// Use this trait when you need runtime polymorphism (e.g., in a registry).
pub trait DynHook<E: Message>: Send + Sync + 'static {
    /// Handle the event (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        event: &'a mut E,
        next: Next<'a, E>,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

// Blanket implementation: Any type implementing Hook implements DynHook automatically.
impl<E: Message, T: Hook<E>> DynHook<E> for T {
    fn handle_dyn<'a>(
        &'a self,
        event: &'a mut E,
        next: Next<'a, E>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(event, next))
    }
}

/// The innermost action of a chain: the write, delete, or response that the
/// hooks wrap.
pub trait Terminal<E>: Send + Sync {
    /// Perform the side effect.
    fn commit<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// A [`Terminal`] backed by a closure. Built with [`terminal_fn`].
pub struct FnTerminal<F>(F);

/// Wrap a closure as a [`Terminal`].
///
/// The closure returns a boxed future borrowing the event. State it needs
/// should be owned (e.g. an `Arc` cloned into the future).
///
/// ```rust
/// use keel_core::{BoxError, terminal_fn};
///
/// let terminal = terminal_fn(|count: &mut u32| {
///     Box::pin(async move {
///         *count += 1;
///         Ok::<_, BoxError>(())
///     })
/// });
/// # let _ = terminal;
/// ```
pub fn terminal_fn<E, F>(f: F) -> FnTerminal<F>
where
    F: for<'a> Fn(&'a mut E) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync,
{
    FnTerminal(f)
}

impl<E, F> Terminal<E> for FnTerminal<F>
where
    F: for<'a> Fn(&'a mut E) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync,
{
    fn commit<'a>(&'a self, event: &'a mut E) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.0)(event)
    }
}
