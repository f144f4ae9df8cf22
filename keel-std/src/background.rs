//! Detached background tasks.
//!
//! Work that must not delay or fail the request that started it: detached
//! after-hooks, password reset mails, cleanup. Each task gets its own
//! timeout, and whatever happens to it (error, timeout, panic) ends up in the
//! log, never at the caller.

use futures::FutureExt;
use keel_core::BoxError;
use std::{any::Any, future::Future, panic::AssertUnwindSafe, time::Duration};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// How a background task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task returned `Ok`.
    Completed,
    /// The task returned an error. Holds its message.
    Failed(String),
    /// The task did not finish within its timeout.
    TimedOut,
    /// The task panicked. Holds the panic message when it was a string.
    Panicked(String),
}

impl TaskOutcome {
    /// Whether the task ran to completion without error.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Spawn `work` on the runtime, detached from the caller.
///
/// The task is bounded by `timeout`. Its outcome is logged under `name`; the
/// returned handle only exists for callers (mostly tests) that want to wait.
///
/// # Example
///
/// ```rust,ignore
/// fire_and_forget("password_reset_mail", Duration::from_secs(30), async move {
///     mailer.send_reset(&admin).await
/// });
/// ```
pub fn fire_and_forget<F>(name: &'static str, timeout: Duration, work: F) -> JoinHandle<TaskOutcome>
where
    F: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    let task = async move {
        let outcome = match tokio::time::timeout(timeout, AssertUnwindSafe(work).catch_unwind()).await
        {
            Ok(Ok(Ok(()))) => TaskOutcome::Completed,
            Ok(Ok(Err(err))) => TaskOutcome::Failed(err.to_string()),
            Ok(Err(panic)) => TaskOutcome::Panicked(panic_message(panic.as_ref())),
            Err(_) => TaskOutcome::TimedOut,
        };

        match &outcome {
            TaskOutcome::Completed => tracing::debug!(task = name, "background task completed"),
            TaskOutcome::Failed(error) => {
                tracing::warn!(task = name, %error, "background task failed")
            }
            TaskOutcome::TimedOut => {
                tracing::warn!(task = name, ?timeout, "background task timed out")
            }
            TaskOutcome::Panicked(message) => {
                tracing::error!(task = name, panic = %message, "background task panicked")
            }
        }
        outcome
    };

    tokio::spawn(task.instrument(tracing::debug_span!("background", task = name)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
