//! Logging Hook - Observability around the inner chain.

use keel_core::{BoxError, Hook, Message, Next};
use std::{fmt::Debug, time::Instant};

/// A hook that logs the event on the way in and the chain outcome on the way
/// out.
///
/// Successful passes log at `debug`, rejections at `warn`.
///
/// # Example
///
/// ```rust,ignore
/// use keel_std::hooks::LoggingHook;
///
/// hooks.admin_before_create().register(LoggingHook::named("admin_create"))?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoggingHook {
    name: &'static str,
}

impl LoggingHook {
    /// Create a new `LoggingHook` with a default name.
    pub fn new() -> Self {
        Self { name: "event" }
    }

    /// Create a new `LoggingHook` with a custom name.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }

    /// The name used in log records.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Hook<E> for LoggingHook
where
    E: Message + Debug,
{
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), BoxError> {
        tracing::debug!(name = self.name, event = ?event, inner = next.remaining(), "entering chain");
        let started = Instant::now();

        let result = next.run(event).await;

        let elapsed = started.elapsed();
        match &result {
            Ok(()) => tracing::debug!(name = self.name, ?elapsed, "chain completed"),
            Err(err) => tracing::warn!(name = self.name, ?elapsed, error = %err, "chain rejected"),
        }
        result
    }
}
