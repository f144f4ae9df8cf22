//! # keel - Hook Dispatch and Search Engines
//!
//! `keel` is the core of a backend-as-a-service: every mutating operation is
//! wrapped by an ordered chain of pluggable hooks, and every listing goes
//! through an allow-listed filter language with bounded pagination.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keel::prelude::*;
//!
//! let hooks: AppHooks<Admin, Collection, Settings> = AppHooks::new();
//! hooks.admin_before_create().register(RejectDuplicates::new(store.clone()))?;
//! hooks.seal();
//!
//! let mut event = ModelEvent::new(admin);
//! Operation::new(hooks.admin_before_create(), hooks.admin_after_create())
//!     .run(&mut event, &save_admin)
//!     .await?;
//! ```
//!
//! ## Crates
//!
//! - [`keel_core`]: events, hooks, chains, [`OperationContext`], [`KeelError`]
//! - [`keel_std`]: hook registries, triggers, background tasks, standard hooks
//! - [`keel_search`]: field resolver, filter and sort parsing, search engine
//!
//! This crate adds the application event set ([`AppHooks`]), the
//! [`define_hooks!`] macro it is declared with, and [`KeelConfig`].

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use keel_core;
pub use keel_search;
pub use keel_std;

#[doc(hidden)]
pub use tracing as __tracing;

pub use keel_core::{
    BoxError, Chain, DynHook, ErrorKind, Event, Hook, KeelError, Message, Next, Noop,
    OperationContext, Terminal, terminal_fn,
};
pub use keel_search::{
    Collection, FieldDef, FieldKind, FieldResolver, MemoryCollection, PageRequest, PageResult,
    Predicate, SearchConfig, SearchEngine, SearchParams, SortSpec, parse_filter, parse_sort,
};
pub use keel_std::{
    AfterMode, EnabledHandle, HookList, Operation, OperationState, TaskOutcome, fire_and_forget,
};

#[macro_use]
mod macros;

pub mod app;
pub mod config;
pub mod events;

pub use app::{AppEvent, AppHooks};
pub use config::{HookConfig, KeelConfig};
pub use events::{
    AuthEvent, ImportEvent, ListEvent, ModelEvent, PasswordResetEvent, SettingsListEvent,
    SettingsUpdateEvent,
};

/// Everything needed to declare hooks and run operations.
pub mod prelude {
    pub use crate::{
        AfterMode, AppEvent, AppHooks, AuthEvent, BoxError, Collection, Event, FieldResolver,
        Hook, HookList, ImportEvent, KeelConfig, KeelError, ListEvent, ModelEvent, Next,
        Operation, OperationContext, PageRequest, PageResult, PasswordResetEvent, SearchEngine,
        SettingsListEvent, SettingsUpdateEvent, Terminal, define_hooks, terminal_fn,
    };
}
