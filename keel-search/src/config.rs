//! Search engine limits.

use keel_core::KeelError;
use serde::{Deserialize, Serialize};

/// Page size used when the request does not give a positive limit.
pub const DEFAULT_LIMIT: u64 = 30;

/// Longest filter expression accepted, in bytes.
pub const MAX_FILTER_LENGTH: usize = 3500;

/// Deepest nesting of groups and negations in a filter.
pub const MAX_FILTER_DEPTH: usize = 32;

/// Most fields a sort expression may name.
pub const MAX_SORT_FIELDS: usize = 8;

/// Limits applied while parsing and executing searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size when the request's limit is absent or not positive.
    pub default_limit: u64,
    /// Upper bound for requested page sizes. `None` leaves them unbounded.
    pub max_limit: Option<u64>,
    /// Longest accepted filter, in bytes.
    pub max_filter_length: usize,
    /// Deepest accepted nesting of parentheses and `!`.
    pub max_filter_depth: usize,
    /// Most fields in one sort expression.
    pub max_sort_fields: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
            max_filter_length: MAX_FILTER_LENGTH,
            max_filter_depth: MAX_FILTER_DEPTH,
            max_sort_fields: MAX_SORT_FIELDS,
        }
    }
}

impl SearchConfig {
    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), KeelError> {
        if self.default_limit == 0 {
            return Err(KeelError::InvalidConfig(
                "search.default_limit must be positive".into(),
            ));
        }
        if let Some(max) = self.max_limit {
            if max < self.default_limit {
                return Err(KeelError::InvalidConfig(format!(
                    "search.max_limit ({max}) is below search.default_limit ({})",
                    self.default_limit
                )));
            }
        }
        if self.max_filter_depth == 0 || self.max_filter_length == 0 || self.max_sort_fields == 0 {
            return Err(KeelError::InvalidConfig(
                "search filter and sort limits must be positive".into(),
            ));
        }
        Ok(())
    }
}
