//! Event payloads of the application hook set.
//!
//! Each payload owns its [`OperationContext`] and the domain data hooks may
//! read or rewrite. Models are generic so the same payloads serve admins,
//! collections and any other resource.

use keel_core::{Event, OperationContext};
use keel_search::PageResult;
use serde_json::Value as Json;

macro_rules! impl_event {
    ($($ty:ident<$gen:ident>),+ $(,)?) => {
        $(
            impl<$gen: Send + Sync + 'static> Event for $ty<$gen> {
                fn context(&self) -> &OperationContext {
                    &self.ctx
                }

                fn context_mut(&mut self) -> &mut OperationContext {
                    &mut self.ctx
                }
            }
        )+
    };
}

impl_event!(
    ModelEvent<M>,
    ListEvent<M>,
    AuthEvent<M>,
    PasswordResetEvent<M>,
    ImportEvent<M>,
    SettingsListEvent<S>,
    SettingsUpdateEvent<S>,
);

/// A single model being viewed, created, updated or deleted.
#[derive(Debug, Clone)]
pub struct ModelEvent<M> {
    /// The operation context.
    pub ctx: OperationContext,
    /// The model. Before-hooks may rewrite it before the terminal stores it.
    pub model: M,
}

impl<M> ModelEvent<M> {
    /// An event under a fresh root context.
    pub fn new(model: M) -> Self {
        Self::with_context(OperationContext::new(), model)
    }

    /// An event under `ctx`.
    pub fn with_context(ctx: OperationContext, model: M) -> Self {
        Self { ctx, model }
    }
}

/// One page of a listing, before it is returned.
///
/// The terminal of a list trigger produces the response; hooks may rewrite
/// `result` on the way in.
#[derive(Debug, Clone)]
pub struct ListEvent<M> {
    /// The operation context.
    pub ctx: OperationContext,
    /// The page about to be returned.
    pub result: PageResult<M>,
}

impl<M> ListEvent<M> {
    /// An event under `ctx`.
    pub fn new(ctx: OperationContext, result: PageResult<M>) -> Self {
        Self { ctx, result }
    }
}

/// An authentication of a model.
#[derive(Debug, Clone)]
pub struct AuthEvent<M> {
    /// The operation context.
    pub ctx: OperationContext,
    /// The authenticated model.
    pub model: M,
    /// The issued token. `None` until the terminal issued it.
    pub token: Option<String>,
    /// Extra response data, `null` when unused.
    pub meta: Json,
}

impl<M> AuthEvent<M> {
    /// An event without token or meta.
    pub fn new(ctx: OperationContext, model: M) -> Self {
        Self {
            ctx,
            model,
            token: None,
            meta: Json::Null,
        }
    }
}

/// A password reset request or confirmation.
#[derive(Debug, Clone)]
pub struct PasswordResetEvent<M> {
    /// The operation context.
    pub ctx: OperationContext,
    /// The model whose password is being reset.
    pub model: M,
}

impl<M> PasswordResetEvent<M> {
    /// An event under `ctx`.
    pub fn new(ctx: OperationContext, model: M) -> Self {
        Self { ctx, model }
    }
}

/// A bulk import of models.
#[derive(Debug, Clone)]
pub struct ImportEvent<M> {
    /// The operation context.
    pub ctx: OperationContext,
    /// The imported models.
    pub models: Vec<M>,
    /// Whether existing models missing from the import are deleted.
    pub delete_missing: bool,
}

impl<M> ImportEvent<M> {
    /// An event under `ctx`.
    pub fn new(ctx: OperationContext, models: Vec<M>, delete_missing: bool) -> Self {
        Self {
            ctx,
            models,
            delete_missing,
        }
    }
}

/// The settings about to be returned.
#[derive(Debug, Clone)]
pub struct SettingsListEvent<S> {
    /// The operation context.
    pub ctx: OperationContext,
    /// Settings with secrets already redacted.
    pub settings: S,
}

impl<S> SettingsListEvent<S> {
    /// An event under `ctx`.
    pub fn new(ctx: OperationContext, settings: S) -> Self {
        Self { ctx, settings }
    }
}

/// A settings change.
#[derive(Debug, Clone)]
pub struct SettingsUpdateEvent<S> {
    /// The operation context.
    pub ctx: OperationContext,
    /// Settings before the change.
    pub old: S,
    /// Settings after the change. Before-hooks may rewrite them.
    pub new: S,
}

impl<S> SettingsUpdateEvent<S> {
    /// An event under `ctx`.
    pub fn new(ctx: OperationContext, old: S, new: S) -> Self {
        Self { ctx, old, new }
    }
}
