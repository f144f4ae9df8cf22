//! Standard hook implementations.
//!
//! - [`LoggingHook`]: traces the event and the outcome of the inner chain
//! - [`TimeoutHook`]: bounds a hook and everything inside it
//! - [`ConditionalHook`]: runs a hook only for matching events

mod conditional;
mod logging;
mod timeout;

pub use conditional::ConditionalHook;
pub use logging::LoggingHook;
pub use timeout::{Forward, TimeoutHook};
