//! Testing utilities for keel.
//!
//! Small hooks and terminals with observable behavior, for asserting chain
//! order, short-circuits, and whether the terminal action ran.
//!
//! # Features
//!
//! - [`RecordingHook`]: records when it enters and leaves the chain
//! - [`FailingHook`]: rejects every event
//! - [`ShortCircuitHook`]: answers without calling `next`
//! - [`CountingTerminal`]: counts commits, optionally failing them

use futures::future::BoxFuture;
use keel_core::{BoxError, Hook, Message, Next, Terminal};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

/// A shared, ordered log of chain steps.
pub type StepLog = Arc<Mutex<Vec<String>>>;

/// Create an empty [`StepLog`].
pub fn step_log() -> StepLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Copy the entries of a [`StepLog`].
pub fn steps(log: &StepLog) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn push(log: &StepLog, step: String) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(step);
}

// ============================================================================
// Recording Hook
// ============================================================================

/// A pass-through hook that logs `"<name>:in"` before calling `next` and
/// `"<name>:out"` after it returns.
///
/// # Example
///
/// ```rust,ignore
/// let log = step_log();
/// list.register(RecordingHook::new("a", log.clone()))?;
/// list.trigger_before(&mut event, &terminal).await?;
/// assert_eq!(steps(&log), vec!["a:in", "a:out"]);
/// ```
#[derive(Clone)]
pub struct RecordingHook {
    name: &'static str,
    log: StepLog,
}

impl RecordingHook {
    /// Create a hook writing to `log`.
    pub fn new(name: &'static str, log: StepLog) -> Self {
        Self { name, log }
    }
}

impl<E: Message> Hook<E> for RecordingHook {
    async fn handle(&self, event: &mut E, next: Next<'_, E>) -> Result<(), BoxError> {
        push(&self.log, format!("{}:in", self.name));
        let result = next.run(event).await;
        push(&self.log, format!("{}:out", self.name));
        result
    }
}

// ============================================================================
// Failing Hook
// ============================================================================

/// A hook that rejects every event with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingHook {
    message: &'static str,
}

impl FailingHook {
    /// Create a hook failing with `message`.
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl<E: Message> Hook<E> for FailingHook {
    async fn handle(&self, _event: &mut E, _next: Next<'_, E>) -> Result<(), BoxError> {
        Err(self.message.into())
    }
}

// ============================================================================
// Short-circuit Hook
// ============================================================================

/// A hook that returns `Ok` without calling `next`.
///
/// Nothing inside it runs, the terminal included.
#[derive(Clone)]
pub struct ShortCircuitHook {
    name: &'static str,
    log: StepLog,
}

impl ShortCircuitHook {
    /// Create a hook that logs `"<name>:stop"` and ends the chain.
    pub fn new(name: &'static str, log: StepLog) -> Self {
        Self { name, log }
    }
}

impl<E: Message> Hook<E> for ShortCircuitHook {
    async fn handle(&self, _event: &mut E, _next: Next<'_, E>) -> Result<(), BoxError> {
        push(&self.log, format!("{}:stop", self.name));
        Ok(())
    }
}

// ============================================================================
// Counting Terminal
// ============================================================================

/// A terminal that counts how often it committed.
///
/// Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct CountingTerminal {
    count: Arc<AtomicUsize>,
    failure: Option<&'static str>,
}

impl CountingTerminal {
    /// A terminal that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal that counts the attempt, then fails with `message`.
    pub fn failing(message: &'static str) -> Self {
        Self {
            count: Arc::default(),
            failure: Some(message),
        }
    }

    /// Number of commits so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<E: Send> Terminal<E> for CountingTerminal {
    fn commit<'a>(&'a self, _event: &'a mut E) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            self.count.fetch_add(1, Ordering::SeqCst);
            match self.failure {
                Some(message) => Err(message.into()),
                None => Ok(()),
            }
        })
    }
}
