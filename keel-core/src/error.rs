//! Error types for keel.
//!
//! Everything the engines surface to a caller is a [`KeelError`]. Hooks,
//! terminal actions and stores return the looser [`BoxError`]; triggers and
//! the search engine classify those at the boundary.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all keel operations.
#[derive(Error, Debug)]
pub enum KeelError {
    /// The filter or sort expression could not be parsed.
    #[error("invalid filter: {reason}{}", fragment_suffix(.fragment, .offset))]
    InvalidFilter {
        /// What went wrong.
        reason: String,
        /// The offending part of the input, when it can be isolated.
        fragment: Option<String>,
        /// Byte offset of the fragment in the input.
        offset: Option<usize>,
    },

    /// A filter or sort referenced a name outside the allow-list.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A before-hook or the terminal action rejected the operation.
    #[error("operation aborted: {0}")]
    BeforeHookAborted(#[source] BoxError),

    /// The backing store failed while executing a query.
    #[error("query execution failed: {0}")]
    ExecutionFailed(#[source] BoxError),

    /// The operation deadline elapsed.
    #[error("deadline exceeded")]
    Timeout,

    /// The operation was cancelled by its caller.
    #[error("operation was cancelled")]
    Cancelled,

    /// A hook was registered after the registry was sealed.
    #[error("hook registry `{0}` is sealed")]
    RegistrySealed(&'static str),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn fragment_suffix(fragment: &Option<String>, offset: &Option<usize>) -> String {
    match (fragment, offset) {
        (Some(fragment), Some(offset)) => format!(" (near `{fragment}` at {offset})"),
        (Some(fragment), None) => format!(" (near `{fragment}`)"),
        _ => String::new(),
    }
}

/// Fieldless classification of [`KeelError`], for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`KeelError::InvalidFilter`].
    InvalidFilter,
    /// See [`KeelError::UnknownField`].
    UnknownField,
    /// See [`KeelError::BeforeHookAborted`].
    BeforeHookAborted,
    /// See [`KeelError::ExecutionFailed`].
    ExecutionFailed,
    /// See [`KeelError::Timeout`].
    Timeout,
    /// See [`KeelError::Cancelled`].
    Cancelled,
    /// See [`KeelError::RegistrySealed`].
    RegistrySealed,
    /// See [`KeelError::InvalidConfig`].
    InvalidConfig,
}

impl KeelError {
    /// Build an [`KeelError::InvalidFilter`] without location information.
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        KeelError::InvalidFilter {
            reason: reason.into(),
            fragment: None,
            offset: None,
        }
    }

    /// Build an [`KeelError::InvalidFilter`] pointing at a fragment of the input.
    pub fn invalid_filter_at(
        reason: impl Into<String>,
        fragment: impl Into<String>,
        offset: usize,
    ) -> Self {
        KeelError::InvalidFilter {
            reason: reason.into(),
            fragment: Some(fragment.into()),
            offset: Some(offset),
        }
    }

    /// Classify an error that escaped a before-chain.
    ///
    /// Deadline and cancellation errors raised inside the chain keep their
    /// kind; everything else means the operation was rejected.
    pub fn aborted(err: BoxError) -> Self {
        match err.downcast::<KeelError>() {
            Ok(keel) => match *keel {
                KeelError::Timeout => KeelError::Timeout,
                KeelError::Cancelled => KeelError::Cancelled,
                KeelError::BeforeHookAborted(cause) => KeelError::BeforeHookAborted(cause),
                other => KeelError::BeforeHookAborted(Box::new(other)),
            },
            Err(err) => KeelError::BeforeHookAborted(err),
        }
    }

    /// Classify an error returned by a backing store.
    pub fn execution(err: BoxError) -> Self {
        match err.downcast::<KeelError>() {
            Ok(keel) => match *keel {
                KeelError::Timeout => KeelError::Timeout,
                KeelError::Cancelled => KeelError::Cancelled,
                KeelError::ExecutionFailed(cause) => KeelError::ExecutionFailed(cause),
                other => KeelError::ExecutionFailed(Box::new(other)),
            },
            Err(err) => KeelError::ExecutionFailed(err),
        }
    }

    /// The fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeelError::InvalidFilter { .. } => ErrorKind::InvalidFilter,
            KeelError::UnknownField(_) => ErrorKind::UnknownField,
            KeelError::BeforeHookAborted(_) => ErrorKind::BeforeHookAborted,
            KeelError::ExecutionFailed(_) => ErrorKind::ExecutionFailed,
            KeelError::Timeout => ErrorKind::Timeout,
            KeelError::Cancelled => ErrorKind::Cancelled,
            KeelError::RegistrySealed(_) => ErrorKind::RegistrySealed,
            KeelError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Whether the caller caused this error (and retrying the same input is pointless).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidFilter | ErrorKind::UnknownField | ErrorKind::BeforeHookAborted
        )
    }
}
