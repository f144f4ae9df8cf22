//! Timeout Hook - Time-limited execution wrapper.

use keel_core::{BoxError, Hook, KeelError, Message, Next};
use std::time::Duration;

/// A hook that only calls `next`.
///
/// Useful as the inner hook of a wrapper that should act on the rest of the
/// chain, e.g. [`TimeoutHook::downstream`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

impl<E: Message> Hook<E> for Forward {
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), BoxError> {
        next.run(event).await
    }
}

/// A hook that wraps another hook with a timeout.
///
/// The bound covers the inner hook and everything the inner hook reaches
/// through `next`, terminal included. When it elapses the pending work is
/// dropped and the chain fails with [`KeelError::Timeout`].
///
/// # Example
///
/// ```rust,ignore
/// use keel_std::hooks::TimeoutHook;
/// use std::time::Duration;
///
/// // Slow webhook may take at most two seconds
/// list.register(TimeoutHook::new(NotifyWebhook, Duration::from_secs(2)))?;
///
/// // Everything registered after this layer, plus the write, gets five
/// list.register(TimeoutHook::downstream(Duration::from_secs(5)))?;
/// ```
#[derive(Debug, Clone)]
pub struct TimeoutHook<H> {
    inner: H,
    duration: Duration,
}

impl<H> TimeoutHook<H> {
    /// Create a new `TimeoutHook` wrapping the given hook.
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// Create a `TimeoutHook` with the timeout specified in seconds.
    pub fn secs(inner: H, seconds: u64) -> Self {
        Self::new(inner, Duration::from_secs(seconds))
    }

    /// Create a `TimeoutHook` with the timeout specified in milliseconds.
    pub fn millis(inner: H, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Get the configured timeout duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get a reference to the inner hook.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl TimeoutHook<Forward> {
    /// Bound the rest of the chain.
    pub fn downstream(duration: Duration) -> Self {
        Self::new(Forward, duration)
    }
}

impl<E, H> Hook<E> for TimeoutHook<H>
where
    E: Message,
    H: Hook<E>,
{
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), BoxError> {
        match tokio::time::timeout(self.duration, self.inner.handle(event, next)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(duration = ?self.duration, "hook timed out");
                Err(Box::new(KeelError::Timeout))
            }
        }
    }
}
