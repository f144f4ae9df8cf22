//! # keel-core
//!
//! Core traits for the keel hook and search engines.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions that only need to implement hooks or terminal actions, without
//! pulling in the registry or the search engine.
//!
//! # Three-Layer Architecture
//!
//! ## Layer 1: Event ([`Message`], [`Event`])
//!
//! Every operation builds exactly one event. The event owns an
//! [`OperationContext`] (cancellation + deadline) and the domain payload, and
//! is exclusively borrowed by the chain while it runs.
//!
//! ## Layer 2: Hook ([`Hook`])
//!
//! The unit of pluggable behavior. A hook receives the event and a [`Next`]
//! continuation. It may call `next` and return its result, call `next` and
//! post-process, or return without calling `next` at all (short-circuit).
//!
//! ## Layer 3: Chain ([`Chain`], [`Terminal`])
//!
//! The onion. An ordered slice of hooks wrapped around a terminal action.
//! The chain recurses over the slice explicitly; the terminal sits at the
//! innermost position and can run at most once per chain invocation because
//! [`Next`] is consumed when called.
//!
//! # Error Types
//!
//! - [`KeelError`] - the single public error, see [`ErrorKind`]
//! - [`BoxError`] - error type returned by hooks, terminals, and stores

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod chain;
mod context;
mod error;
mod hook;
mod message;

// Re-exports
pub use chain::{Chain, Next, Noop};
pub use context::OperationContext;
pub use error::{BoxError, ErrorKind, KeelError};
pub use hook::{DynHook, FnTerminal, Hook, Terminal, terminal_fn};
pub use message::{Event, Message};
