//! # Application Hook Set
//!
//! The hook registries of the admin, collection and settings operations.
//!
//! `A` is the admin model, `C` the collection model and `S` the settings
//! model. Mutating operations come in before/after pairs meant for
//! [`Operation`]; list, view and auth request kinds wrap the terminal that
//! produces the response, so hooks can rewrite it or answer themselves.

use crate::{
    config::HookConfig,
    events::{
        AuthEvent, ImportEvent, ListEvent, ModelEvent, PasswordResetEvent, SettingsListEvent,
        SettingsUpdateEvent,
    },
};
use keel_core::{OperationContext, Terminal};
use keel_std::{Operation, TaskOutcome, fire_and_forget};
use tokio::task::JoinHandle;

define_hooks! {
    /// One [`HookList`](keel_std::HookList) per application event kind.
    pub struct AppHooks<A, C, S>;

    /// The application event kinds.
    pub enum AppEvent {
        /// Wraps the response of a successful admin authentication.
        AdminAuthRequest => admin_auth_request: AuthEvent<A>,
        /// Before an admin token is refreshed.
        AdminBeforeAuthRefresh => admin_before_auth_refresh: AuthEvent<A>,
        /// After an admin token was refreshed.
        AdminAfterAuthRefresh => admin_after_auth_refresh: AuthEvent<A>,
        /// Before an admin authenticates with a password.
        AdminBeforeAuthWithPassword => admin_before_auth_with_password: AuthEvent<A>,
        /// After an admin authenticated with a password.
        AdminAfterAuthWithPassword => admin_after_auth_with_password: AuthEvent<A>,
        /// Before a password reset mail is sent.
        AdminBeforeRequestPasswordReset => admin_before_request_password_reset: PasswordResetEvent<A>,
        /// After a password reset mail was sent.
        AdminAfterRequestPasswordReset => admin_after_request_password_reset: PasswordResetEvent<A>,
        /// Before a password reset is confirmed.
        AdminBeforeConfirmPasswordReset => admin_before_confirm_password_reset: PasswordResetEvent<A>,
        /// After a password reset was confirmed.
        AdminAfterConfirmPasswordReset => admin_after_confirm_password_reset: PasswordResetEvent<A>,
        /// Wraps the response of an admin listing.
        AdminsList => admins_list: ListEvent<A>,
        /// Wraps the response of a single admin.
        AdminView => admin_view: ModelEvent<A>,
        /// Before an admin is created.
        AdminBeforeCreate => admin_before_create: ModelEvent<A>,
        /// After an admin was created.
        AdminAfterCreate => admin_after_create: ModelEvent<A>,
        /// Before an admin is updated.
        AdminBeforeUpdate => admin_before_update: ModelEvent<A>,
        /// After an admin was updated.
        AdminAfterUpdate => admin_after_update: ModelEvent<A>,
        /// Before an admin is deleted.
        AdminBeforeDelete => admin_before_delete: ModelEvent<A>,
        /// After an admin was deleted.
        AdminAfterDelete => admin_after_delete: ModelEvent<A>,
        /// Wraps the response of a collection listing.
        CollectionsList => collections_list: ListEvent<C>,
        /// Wraps the response of a single collection.
        CollectionView => collection_view: ModelEvent<C>,
        /// Before a collection is created.
        CollectionBeforeCreate => collection_before_create: ModelEvent<C>,
        /// After a collection was created.
        CollectionAfterCreate => collection_after_create: ModelEvent<C>,
        /// Before a collection is updated.
        CollectionBeforeUpdate => collection_before_update: ModelEvent<C>,
        /// After a collection was updated.
        CollectionAfterUpdate => collection_after_update: ModelEvent<C>,
        /// Before a collection is deleted.
        CollectionBeforeDelete => collection_before_delete: ModelEvent<C>,
        /// After a collection was deleted.
        CollectionAfterDelete => collection_after_delete: ModelEvent<C>,
        /// Before collections are imported.
        CollectionsBeforeImport => collections_before_import: ImportEvent<C>,
        /// After collections were imported.
        CollectionsAfterImport => collections_after_import: ImportEvent<C>,
        /// Wraps the response of the settings listing.
        SettingsList => settings_list: SettingsListEvent<S>,
        /// Before settings are updated.
        SettingsBeforeUpdate => settings_before_update: SettingsUpdateEvent<S>,
        /// After settings were updated.
        SettingsAfterUpdate => settings_after_update: SettingsUpdateEvent<S>,
    }
}

impl<A, C, S> AppHooks<A, C, S>
where
    A: Send + Sync + 'static,
    C: Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    /// The create operation of admins.
    pub fn admin_create(&self) -> Operation<'_, ModelEvent<A>> {
        Operation::new(&self.admin_before_create, &self.admin_after_create)
    }

    /// The update operation of admins.
    pub fn admin_update(&self) -> Operation<'_, ModelEvent<A>> {
        Operation::new(&self.admin_before_update, &self.admin_after_update)
    }

    /// The delete operation of admins.
    pub fn admin_delete(&self) -> Operation<'_, ModelEvent<A>> {
        Operation::new(&self.admin_before_delete, &self.admin_after_delete)
    }

    /// The create operation of collections.
    pub fn collection_create(&self) -> Operation<'_, ModelEvent<C>> {
        Operation::new(&self.collection_before_create, &self.collection_after_create)
    }

    /// The update operation of collections.
    pub fn collection_update(&self) -> Operation<'_, ModelEvent<C>> {
        Operation::new(&self.collection_before_update, &self.collection_after_update)
    }

    /// The delete operation of collections.
    pub fn collection_delete(&self) -> Operation<'_, ModelEvent<C>> {
        Operation::new(&self.collection_before_delete, &self.collection_after_delete)
    }

    /// The import operation of collections.
    pub fn collections_import(&self) -> Operation<'_, ImportEvent<C>> {
        Operation::new(&self.collections_before_import, &self.collections_after_import)
    }

    /// The update operation of settings.
    pub fn settings_update(&self) -> Operation<'_, SettingsUpdateEvent<S>> {
        Operation::new(&self.settings_before_update, &self.settings_after_update)
    }

    /// Start a password reset request in the background.
    ///
    /// The request hooks, the `send` terminal and the after hooks all run on
    /// a detached task bounded by `config.background_timeout`, under a fresh
    /// context. Callers
    /// answer success right away, whatever the task's outcome.
    pub fn request_password_reset<T>(
        &self,
        admin: A,
        send: T,
        config: &HookConfig,
    ) -> JoinHandle<TaskOutcome>
    where
        T: Terminal<PasswordResetEvent<A>> + 'static,
    {
        let before = self.admin_before_request_password_reset.clone();
        let after = self.admin_after_request_password_reset.clone();
        let timeout = config.background_timeout;

        fire_and_forget("admin_request_password_reset", timeout, async move {
            let mut event = PasswordResetEvent::new(OperationContext::detached(timeout), admin);
            before.trigger_before(&mut event, &send).await?;
            after.trigger_after(&mut event).await
        })
    }
}
