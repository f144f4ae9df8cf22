//! # Trigger Executor
//!
//! Runs a [`HookList`] against an event.
//!
//! - **before**: the hooks wrap a terminal action as an interceptor chain.
//!   The first error aborts the operation and is returned; nothing inside the
//!   failing layer runs, the terminal included.
//! - **after**: every enabled hook runs on its own with [`Next::noop`], in
//!   registration order, once the operation committed. Failures are logged
//!   and never undo the operation.
//!
//! [`Operation`] ties a before list and an after list together and tracks
//! where the operation is:
//!
//! ```text
//! Pending ─► BeforeChainRunning ─┬─► Committed ─► AfterChainRunning ─► Done
//!                                └─► Aborted
//! ```

use crate::{
    background::{TaskOutcome, fire_and_forget},
    registry::HookList,
};
use keel_core::{BoxError, Chain, Event, KeelError, Next, OperationContext, Terminal};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::Instrument;

impl<E: Event> HookList<E> {
    /// Run the hooks around `terminal`.
    ///
    /// The chain runs under the event's context: cancellation and deadline
    /// surface as [`KeelError::Cancelled`] and [`KeelError::Timeout`]. Any
    /// other failure, from a hook or from the terminal, becomes
    /// [`KeelError::BeforeHookAborted`].
    pub async fn trigger_before(
        &self,
        event: &mut E,
        terminal: &dyn Terminal<E>,
    ) -> Result<(), KeelError> {
        let hooks = self.handlers();
        let ctx = event.context().clone();
        let name = self.name();

        let result = ctx
            .run(async {
                Chain::new(&hooks, terminal)
                    .run(&mut *event)
                    .await
                    .map_err(KeelError::aborted)
            })
            .instrument(tracing::debug_span!("trigger_before", event = name, hooks = hooks.len()))
            .await;

        match &result {
            Ok(()) => tracing::debug!(event = name, "operation committed"),
            Err(err) => tracing::debug!(event = name, error = %err, "operation aborted"),
        }
        result
    }

    /// Run every enabled hook for its side effects.
    ///
    /// All hooks run even when an earlier one fails; the first failure is
    /// returned for the caller's log. A cancelled or expired context stops
    /// the remaining hooks.
    pub async fn trigger_after(&self, event: &mut E) -> Result<(), BoxError> {
        let entries = self.entries();
        let ctx = event.context().clone();
        let mut first_error: Option<BoxError> = None;

        for entry in entries.iter().filter(|entry| entry.is_enabled()) {
            let outcome = ctx
                .run(async { Ok(entry.hook().handle_dyn(&mut *event, Next::noop()).await) })
                .await;

            let err = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(interrupted) => {
                    tracing::warn!(event = self.name(), hook = entry.name(), error = %interrupted, "after trigger interrupted");
                    first_error.get_or_insert(Box::new(interrupted));
                    break;
                }
            };

            tracing::warn!(event = self.name(), hook = entry.name(), error = %err, "after hook failed");
            first_error.get_or_insert(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run the after hooks on a detached task.
    ///
    /// The event's context is replaced by a fresh one bounded by `timeout`,
    /// so cancelling the request does not reach the hooks.
    pub fn spawn_after(&self, mut event: E, timeout: Duration) -> JoinHandle<TaskOutcome> {
        let list = self.clone();
        *event.context_mut() = OperationContext::detached(timeout);

        fire_and_forget(self.name(), timeout, async move {
            list.trigger_after(&mut event).await
        })
    }
}

/// Reason carried by the [`KeelError::BeforeHookAborted`] returned when an
/// [`Operation`] is started a second time.
pub const ALREADY_STARTED: &str = "operation already started";

/// Progress of one [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    /// Nothing ran yet.
    Pending,
    /// The before chain is running.
    BeforeChainRunning,
    /// The terminal action succeeded.
    Committed,
    /// A hook or the terminal rejected the operation. Terminal state.
    Aborted,
    /// The after hooks are running.
    AfterChainRunning,
    /// The after phase finished (or was handed to a background task).
    Done,
}

/// Where the after phase of an [`Operation`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterMode {
    /// In the caller's task, before `run` returns.
    #[default]
    Inline,
    /// On a background task with its own timeout. Requires `E: Clone`.
    Detached {
        /// Bound on the whole after phase.
        timeout: Duration,
    },
}

/// One mutating operation: a before list wrapping the terminal action, then
/// an after list once it committed.
///
/// # Example
///
/// ```rust,ignore
/// let mut op = Operation::new(hooks.admin_before_create(), hooks.admin_after_create());
/// op.run(&mut event, &save_admin).await?;
/// assert_eq!(op.state(), OperationState::Done);
/// ```
pub struct Operation<'h, E: Event> {
    before: &'h HookList<E>,
    after: &'h HookList<E>,
    mode: AfterMode,
    state: OperationState,
    background: Option<JoinHandle<TaskOutcome>>,
}

impl<'h, E: Event> Operation<'h, E> {
    /// Couple a before list with an after list. The after phase runs inline.
    pub fn new(before: &'h HookList<E>, after: &'h HookList<E>) -> Self {
        Self {
            before,
            after,
            mode: AfterMode::Inline,
            state: OperationState::Pending,
            background: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> OperationState {
        self.state
    }

    /// The configured after mode.
    pub fn after_mode(&self) -> AfterMode {
        self.mode
    }

    /// Handle of the detached after phase, if one was spawned.
    pub fn take_background(&mut self) -> Option<JoinHandle<TaskOutcome>> {
        self.background.take()
    }

    /// Run the before chain around `terminal`.
    ///
    /// Only valid from [`OperationState::Pending`]; otherwise fails with
    /// [`ALREADY_STARTED`] and leaves the state untouched.
    pub async fn before(
        &mut self,
        event: &mut E,
        terminal: &dyn Terminal<E>,
    ) -> Result<(), KeelError> {
        if self.state != OperationState::Pending {
            tracing::warn!(event = self.before.name(), state = ?self.state, "operation started twice");
            return Err(KeelError::aborted(ALREADY_STARTED.into()));
        }

        self.state = OperationState::BeforeChainRunning;
        let result = self.before.trigger_before(event, terminal).await;
        self.state = match result {
            Ok(()) => OperationState::Committed,
            Err(_) => OperationState::Aborted,
        };
        result
    }

    /// Run the after phase in the caller's task.
    ///
    /// Does nothing unless the operation committed. Errors are logged only.
    pub async fn after_inline(&mut self, event: &mut E) {
        if self.state != OperationState::Committed {
            return;
        }

        self.state = OperationState::AfterChainRunning;
        if let Err(err) = self.after.trigger_after(event).await {
            tracing::debug!(event = self.after.name(), error = %err, "after phase finished with errors");
        }
        self.state = OperationState::Done;
    }
}

impl<'h, E: Event + Clone> Operation<'h, E> {
    /// Choose where the after phase runs.
    pub fn with_after_mode(mut self, mode: AfterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the whole operation.
    ///
    /// The result is the before phase's result. The after phase cannot change
    /// it.
    pub async fn run(&mut self, event: &mut E, terminal: &dyn Terminal<E>) -> Result<(), KeelError> {
        self.before(event, terminal).await?;

        match self.mode {
            AfterMode::Inline => self.after_inline(event).await,
            AfterMode::Detached { timeout } => {
                self.state = OperationState::AfterChainRunning;
                self.background = Some(self.after.spawn_after(event.clone(), timeout));
                self.state = OperationState::Done;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingTerminal, FailingHook, RecordingHook};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct Save {
        ctx: OperationContext,
        name: String,
    }

    impl Event for Save {
        fn context(&self) -> &OperationContext {
            &self.ctx
        }

        fn context_mut(&mut self) -> &mut OperationContext {
            &mut self.ctx
        }
    }

    fn save(name: &str) -> Save {
        Save {
            ctx: OperationContext::new(),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_before_without_hooks_commits() {
        let list = HookList::<Save>::new("save_before");
        let terminal = CountingTerminal::new();

        list.trigger_before(&mut save("a"), &terminal).await.unwrap();
        assert_eq!(terminal.count(), 1);
    }

    #[tokio::test]
    async fn test_before_error_skips_terminal() {
        let list = HookList::<Save>::new("save_before");
        list.register(FailingHook::new("duplicate name")).unwrap();
        let terminal = CountingTerminal::new();

        let err = list
            .trigger_before(&mut save("a"), &terminal)
            .await
            .unwrap_err();

        assert!(matches!(err, KeelError::BeforeHookAborted(_)));
        assert_eq!(err.to_string(), "operation aborted: duplicate name");
        assert_eq!(terminal.count(), 0);
    }

    #[tokio::test]
    async fn test_before_honours_cancelled_context() {
        let list = HookList::<Save>::new("save_before");
        let terminal = CountingTerminal::new();
        let mut event = save("a");
        event.ctx.cancel();

        let err = list.trigger_before(&mut event, &terminal).await.unwrap_err();
        assert!(matches!(err, KeelError::Cancelled));
        assert_eq!(terminal.count(), 0);
    }

    #[tokio::test]
    async fn test_after_without_hooks_is_noop() {
        let list = HookList::<Save>::new("save_after");
        assert!(list.trigger_after(&mut save("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_after_continues_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let list = HookList::<Save>::new("save_after");
        list.register(RecordingHook::new("first", log.clone())).unwrap();
        list.register(FailingHook::new("mailer down")).unwrap();
        list.register(RecordingHook::new("third", log.clone())).unwrap();

        let err = list.trigger_after(&mut save("a")).await.unwrap_err();

        assert_eq!(err.to_string(), "mailer down");
        assert_eq!(*log.lock().unwrap(), vec!["first:in", "first:out", "third:in", "third:out"]);
    }

    #[tokio::test]
    async fn test_operation_states() {
        let before = HookList::<Save>::new("save_before");
        let after = HookList::<Save>::new("save_after");
        let log = Arc::new(Mutex::new(Vec::new()));
        after.register(RecordingHook::new("audit", log.clone())).unwrap();
        let terminal = CountingTerminal::new();

        let mut op = Operation::new(&before, &after);
        assert_eq!(op.state(), OperationState::Pending);
        op.run(&mut save("a"), &terminal).await.unwrap();

        assert_eq!(op.state(), OperationState::Done);
        assert_eq!(log.lock().unwrap().len(), 2);

        // a finished operation does not run twice
        let err = op.before(&mut save("a"), &terminal).await.unwrap_err();
        assert_eq!(err.to_string(), format!("operation aborted: {ALREADY_STARTED}"));
        assert_eq!(op.state(), OperationState::Done);
        assert_eq!(terminal.count(), 1);
    }

    #[tokio::test]
    async fn test_aborted_operation_skips_after() {
        let before = HookList::<Save>::new("save_before");
        let after = HookList::<Save>::new("save_after");
        before.register(FailingHook::new("no")).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        after.register(RecordingHook::new("audit", log.clone())).unwrap();

        let mut op = Operation::new(&before, &after);
        let result = op.run(&mut save("a"), &CountingTerminal::new()).await;

        assert!(result.is_err());
        assert_eq!(op.state(), OperationState::Aborted);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_after_failure_keeps_result() {
        let before = HookList::<Save>::new("save_before");
        let after = HookList::<Save>::new("save_after");
        after.register(FailingHook::new("audit failed")).unwrap();

        let mut op = Operation::new(&before, &after);
        assert!(op.run(&mut save("a"), &CountingTerminal::new()).await.is_ok());
        assert_eq!(op.state(), OperationState::Done);
    }

    #[tokio::test]
    async fn test_detached_after_outlives_request() {
        let before = HookList::<Save>::new("save_before");
        let after = HookList::<Save>::new("save_after");
        let log = Arc::new(Mutex::new(Vec::new()));
        after.register(RecordingHook::new("audit", log.clone())).unwrap();

        let mut event = save("a");
        let mut op = Operation::new(&before, &after).with_after_mode(AfterMode::Detached {
            timeout: Duration::from_secs(1),
        });
        op.run(&mut event, &CountingTerminal::new()).await.unwrap();

        // cancelling the request must not reach the detached hooks
        event.ctx.cancel();
        let outcome = op.take_background().unwrap().await.unwrap();

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(*log.lock().unwrap(), vec!["audit:in", "audit:out"]);
        assert_eq!(event.name, "a");
    }
}
