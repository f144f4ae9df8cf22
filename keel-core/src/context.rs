//! # Operation Context
//!
//! The cancellation scope and deadline of one operation.
//!
//! Every event carries an [`OperationContext`]. Triggers and the search engine
//! run their work through [`OperationContext::run`], which races the work
//! against cancellation and the deadline and surfaces each as its own error
//! kind.
//!
//! Contexts form a tree: [`child`](OperationContext::child) contexts are
//! cancelled together with their parent. [`detached`](OperationContext::detached)
//! contexts share nothing with the request that created them and are meant for
//! background work that outlives the response.

use crate::error::KeelError;
use std::{future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline for one operation.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Create a root context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Create a root context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A fresh root context for background work.
    ///
    /// Cancelling the originating request does not reach it.
    pub fn detached(timeout: Duration) -> Self {
        Self::with_timeout(timeout)
    }

    /// A child context, cancelled whenever `self` is.
    ///
    /// The child keeps the parent's deadline unless `timeout` is shorter.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout) {
            (Some(current), Some(timeout)) => Some(current.min(Instant::now() + timeout)),
            (None, Some(timeout)) => Some(Instant::now() + timeout),
            (current, None) => current,
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancel this context and every child.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether this context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline already passed.
    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// Check the context without awaiting anything.
    pub fn check(&self) -> Result<(), KeelError> {
        if self.is_cancelled() {
            Err(KeelError::Cancelled)
        } else if self.is_expired() {
            Err(KeelError::Timeout)
        } else {
            Ok(())
        }
    }

    /// Run `work` until it finishes, the context is cancelled, or the deadline
    /// passes, whichever happens first.
    ///
    /// The losing futures are dropped, which aborts in-flight store calls at
    /// their next suspension point.
    pub async fn run<T, F>(&self, work: F) -> Result<T, KeelError>
    where
        F: Future<Output = Result<T, KeelError>>,
    {
        self.check()?;

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(KeelError::Cancelled),
                result = work => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| KeelError::Timeout)?,
            None => guarded.await,
        }
    }
}
