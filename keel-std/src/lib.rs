//! # keel-std
//!
//! Hook registries and the trigger executor for keel.
//!
//! This crate provides:
//! - **Registry**: [`HookList`], one ordered hook list per event kind
//! - **Triggers**: before/after execution on [`HookList`], plus the
//!   [`Operation`] lifecycle
//! - **Background work**: [`fire_and_forget`] for detached, timed, logged tasks
//! - **Standard hooks**: Logging, Timeout, Conditional
//! - **Testing**: recording, failing and short-circuit hooks, counting terminal

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use keel_core;

// Modules
pub mod background;
pub mod hooks;
pub mod registry;
pub mod testing;
pub mod trigger;

pub use background::{TaskOutcome, fire_and_forget};
pub use registry::{EnabledHandle, HookEntry, HookList};
pub use trigger::{ALREADY_STARTED, AfterMode, Operation, OperationState};
