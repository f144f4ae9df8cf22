//! Top-level configuration.
//!
//! ```json
//! {
//!   "search": { "default_limit": 30, "max_limit": 500 },
//!   "hooks": { "after_hook_timeout": 5000, "detach_after_hooks": true }
//! }
//! ```
//!
//! Every field has a default; durations are milliseconds.

use keel_core::KeelError;
use keel_search::SearchConfig;
use keel_std::AfterMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits for after-phases and background tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Bound on a detached after-phase.
    #[serde(with = "millis")]
    pub after_hook_timeout: Duration,
    /// Bound on fire-and-forget work such as password reset mails.
    #[serde(with = "millis")]
    pub background_timeout: Duration,
    /// Run after-phases on background tasks instead of the caller's task.
    pub detach_after_hooks: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            after_hook_timeout: Duration::from_secs(5),
            background_timeout: Duration::from_secs(30),
            detach_after_hooks: false,
        }
    }
}

impl HookConfig {
    /// The [`AfterMode`] operations should use.
    pub fn after_mode(&self) -> AfterMode {
        if self.detach_after_hooks {
            AfterMode::Detached {
                timeout: self.after_hook_timeout,
            }
        } else {
            AfterMode::Inline
        }
    }
}

/// Configuration of both engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeelConfig {
    /// Search limits.
    pub search: SearchConfig,
    /// Hook limits.
    pub hooks: HookConfig,
}

impl KeelConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, KeelError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| KeelError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engines cannot work with.
    pub fn validate(&self) -> Result<(), KeelError> {
        self.search.validate()?;
        if self.hooks.after_hook_timeout.is_zero() {
            return Err(KeelError::InvalidConfig(
                "hooks.after_hook_timeout must be positive".into(),
            ));
        }
        if self.hooks.background_timeout.is_zero() {
            return Err(KeelError::InvalidConfig(
                "hooks.background_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
