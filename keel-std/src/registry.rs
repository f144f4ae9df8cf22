//! Hook registry.
//!
//! A [`HookList`] is the ordered list of hooks for one named event kind.
//! Hooks run in registration order; there is no priority system.
//!
//! Reads take a snapshot (`Arc` of the current entries) under a short read
//! lock and never hold the lock while hooks run. Registration swaps in a new
//! snapshot under the write lock, so late registration is safe but never
//! affects a trigger that already started. After [`HookList::seal`] the list
//! is frozen.

use keel_core::{DynHook, Hook, KeelError, Message};
use std::{
    borrow::Cow,
    fmt,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// A handle for toggling one registered hook at runtime.
#[derive(Debug, Clone)]
pub struct EnabledHandle(Arc<AtomicBool>);

impl EnabledHandle {
    /// Create a new enabled handle with the given initial state.
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Check if the hook is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Enable the hook.
    pub fn enable(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Disable the hook.
    pub fn disable(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Toggle the hook's enabled state, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for EnabledHandle {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A registered hook with its label and enabled switch.
pub struct HookEntry<E: Message> {
    hook: Arc<dyn DynHook<E>>,
    name: Cow<'static, str>,
    enabled: EnabledHandle,
}

impl<E: Message> HookEntry<E> {
    /// The hook itself.
    pub fn hook(&self) -> &Arc<dyn DynHook<E>> {
        &self.hook
    }

    /// Label used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the hook currently takes part in triggers.
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Handle for toggling this entry.
    pub fn enabled_handle(&self) -> EnabledHandle {
        self.enabled.clone()
    }
}

impl<E: Message> Clone for HookEntry<E> {
    fn clone(&self) -> Self {
        Self {
            hook: Arc::clone(&self.hook),
            name: self.name.clone(),
            enabled: self.enabled.clone(),
        }
    }
}

struct State<E: Message> {
    entries: Arc<[HookEntry<E>]>,
    sealed: bool,
}

/// The ordered hooks of one event kind.
///
/// Cloning a `HookList` is cheap and yields a handle to the same list.
///
/// # Example
///
/// ```rust,ignore
/// let on_create = HookList::<AdminCreate>::new("admin_before_create");
/// on_create.register(RejectDuplicates::new(store.clone()))?;
/// on_create.register_named("audit", AuditHook)?;
/// on_create.seal();
/// ```
pub struct HookList<E: Message> {
    name: &'static str,
    state: Arc<RwLock<State<E>>>,
}

impl<E: Message> HookList<E> {
    /// Create an empty list for the event kind `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(RwLock::new(State {
                entries: Arc::from(Vec::new()),
                sealed: false,
            })),
        }
    }

    /// The event kind this list serves.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a hook. Its label is its type name.
    pub fn register<H: Hook<E>>(&self, hook: H) -> Result<EnabledHandle, KeelError> {
        self.register_dyn(std::any::type_name::<H>(), Arc::new(hook))
    }

    /// Append a hook with an explicit label.
    pub fn register_named<H: Hook<E>>(
        &self,
        name: impl Into<Cow<'static, str>>,
        hook: H,
    ) -> Result<EnabledHandle, KeelError> {
        self.register_dyn(name, Arc::new(hook))
    }

    /// Append an already type-erased hook.
    pub fn register_dyn(
        &self,
        name: impl Into<Cow<'static, str>>,
        hook: Arc<dyn DynHook<E>>,
    ) -> Result<EnabledHandle, KeelError> {
        let name = name.into();
        let enabled = EnabledHandle::default();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.sealed {
            tracing::warn!(event = self.name, hook = %name, "registration rejected, registry sealed");
            return Err(KeelError::RegistrySealed(self.name));
        }

        let mut entries = state.entries.to_vec();
        entries.push(HookEntry {
            hook,
            name: name.clone(),
            enabled: enabled.clone(),
        });
        state.entries = Arc::from(entries);

        tracing::debug!(event = self.name, hook = %name, position = state.entries.len(), "hook registered");
        Ok(enabled)
    }

    /// Snapshot of every registered entry, enabled or not.
    pub fn entries(&self) -> Arc<[HookEntry<E>]> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.entries)
    }

    /// The enabled hooks in registration order.
    ///
    /// Empty when nothing is registered; triggering an empty list runs only
    /// the terminal.
    pub fn handlers(&self) -> Vec<Arc<dyn DynHook<E>>> {
        self.entries()
            .iter()
            .filter(|entry| entry.is_enabled())
            .map(|entry| Arc::clone(&entry.hook))
            .collect()
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if the list has no hooks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse every further registration.
    pub fn seal(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.sealed = true;
    }

    /// Whether [`seal`](Self::seal) was called.
    pub fn is_sealed(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sealed
    }
}

impl<E: Message> Clone for HookList<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Message> fmt::Debug for HookList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        f.debug_struct("HookList")
            .field("name", &self.name)
            .field(
                "hooks",
                &entries.iter().map(HookEntry::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
