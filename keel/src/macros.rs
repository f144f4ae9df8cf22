// ============================================================================
// Closed hook registries
// ============================================================================

/// Declare a closed set of event kinds with one [`HookList`](crate::HookList)
/// per kind.
///
/// The macro generates:
/// - a fieldless tag enum with `ALL` and `name()`, one variant per kind
/// - a registry struct with one `HookList` per kind and an accessor of the
///   same name
/// - `new()`, `Default`, `Clone`, `Debug`
/// - `handler_count(tag)`, `seal()` and `is_sealed()` over all kinds
///
/// Every type parameter is bounded by `Send + Sync + 'static`.
///
/// # Example
///
/// ```rust
/// use keel::{define_hooks, events::ModelEvent};
///
/// define_hooks! {
///     /// Hooks around posts.
///     pub struct PostHooks<P>;
///
///     /// Post event kinds.
///     pub enum PostEvent {
///         /// Before a post is stored.
///         BeforeCreate => before_create: ModelEvent<P>,
///         /// After a post is stored.
///         AfterCreate => after_create: ModelEvent<P>,
///     }
/// }
///
/// let hooks: PostHooks<String> = PostHooks::new();
/// assert_eq!(PostEvent::ALL.len(), 2);
/// assert_eq!(PostEvent::AfterCreate.name(), "after_create");
/// assert_eq!(hooks.handler_count(PostEvent::BeforeCreate), 0);
/// ```
#[macro_export]
macro_rules! define_hooks {
    (
        $(#[$smeta:meta])*
        $svis:vis struct $name:ident<$($gen:ident),* $(,)?>;

        $(#[$emeta:meta])*
        $evis:vis enum $tag:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $field:ident : $event:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$emeta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $evis enum $tag {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $tag {
            /// Every kind, in declaration order.
            pub const ALL: &'static [$tag] = &[$($tag::$variant),+];

            /// The kind's registry name.
            pub fn name(self) -> &'static str {
                match self {
                    $($tag::$variant => stringify!($field),)+
                }
            }
        }

        impl ::std::fmt::Display for $tag {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        $(#[$smeta])*
        $svis struct $name<$($gen: Send + Sync + 'static),*> {
            $($field: $crate::HookList<$event>,)+
        }

        impl<$($gen: Send + Sync + 'static),*> $name<$($gen),*> {
            /// Empty, unsealed registries for every kind.
            pub fn new() -> Self {
                Self {
                    $($field: $crate::HookList::new(stringify!($field)),)+
                }
            }

            $(
                $(#[$vmeta])*
                pub fn $field(&self) -> &$crate::HookList<$event> {
                    &self.$field
                }
            )+

            /// Number of enabled hooks registered for `kind`.
            pub fn handler_count(&self, kind: $tag) -> usize {
                match kind {
                    $($tag::$variant => self.$field.handlers().len(),)+
                }
            }

            /// Seal every registry. Later registrations fail.
            pub fn seal(&self) {
                $(self.$field.seal();)+
                $crate::__tracing::debug!(registry = stringify!($name), "hook registries sealed");
            }

            /// Whether every registry is sealed.
            pub fn is_sealed(&self) -> bool {
                true $(&& self.$field.is_sealed())+
            }
        }

        impl<$($gen: Send + Sync + 'static),*> Default for $name<$($gen),*> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<$($gen: Send + Sync + 'static),*> Clone for $name<$($gen),*> {
            fn clone(&self) -> Self {
                Self {
                    $($field: self.$field.clone(),)+
                }
            }
        }

        impl<$($gen: Send + Sync + 'static),*> ::std::fmt::Debug for $name<$($gen),*> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &self.$field))+
                    .finish()
            }
        }
    };
}
