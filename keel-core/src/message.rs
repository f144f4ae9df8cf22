//! Message and event traits.

use crate::context::OperationContext;

/// A marker trait for payloads that can travel through a hook chain.
///
/// Messages must be `Send + Sync + 'static` to be safe for async use.
/// Every such type is a message; the trait only exists to give the bound a
/// name and a readable diagnostic.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "All events in keel must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Message for T {}

/// A message that belongs to one operation and carries its context.
///
/// Triggers read the context to bound the chain by the caller's deadline and
/// cancellation. Detached after-phases replace it with a fresh one so
/// background work never shares the request scope.
///
/// # Example
///
/// ```rust
/// use keel_core::{Event, OperationContext};
///
/// struct AdminCreate {
///     ctx: OperationContext,
///     email: String,
/// }
///
/// impl Event for AdminCreate {
///     fn context(&self) -> &OperationContext {
///         &self.ctx
///     }
///
///     fn context_mut(&mut self) -> &mut OperationContext {
///         &mut self.ctx
///     }
/// }
/// ```
pub trait Event: Message {
    /// The operation context of this event.
    fn context(&self) -> &OperationContext;

    /// Mutable access to the operation context.
    fn context_mut(&mut self) -> &mut OperationContext;
}
