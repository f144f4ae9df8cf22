//! Page requests and results.

use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};

/// The requested window of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page size. Zero or negative means the configured default.
    pub limit: i64,
    /// Rows to skip. Negative values count as zero.
    pub offset: i64,
    /// Free-text search term, if any.
    pub search: Option<String>,
}

impl PageRequest {
    /// A window of `limit` rows starting at `offset`.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            search: None,
        }
    }

    /// The page size the engine actually uses: the default when the request
    /// does not ask for a positive limit, capped by `max_limit`.
    pub fn effective_limit(&self, config: &SearchConfig) -> u64 {
        let requested = u64::try_from(self.limit)
            .ok()
            .filter(|limit| *limit > 0)
            .unwrap_or(config.default_limit);
        match config.max_limit {
            Some(max) => requested.min(max),
            None => requested,
        }
    }

    /// The offset the engine actually uses.
    pub fn effective_offset(&self) -> u64 {
        u64::try_from(self.offset).unwrap_or(0)
    }
}

/// One page of a listing plus the numbers needed to page through the rest.
///
/// Serializes as `{"items": [...], "limit", "offset", "totalItems", "totalPages"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// The rows of this page.
    pub items: Vec<T>,
    /// Effective page size.
    pub limit: u64,
    /// Effective offset.
    pub offset: u64,
    /// Rows matching the filter, over all pages.
    pub total_items: u64,
    /// `ceil(total_items / limit)`.
    pub total_pages: u64,
}

impl<T> PageResult<T> {
    /// Assemble a page and compute `total_pages`. A zero limit counts as one.
    pub fn new(items: Vec<T>, limit: u64, offset: u64, total_items: u64) -> Self {
        Self {
            items,
            limit,
            offset,
            total_items,
            total_pages: total_items.div_ceil(limit.max(1)),
        }
    }

    /// Convert the items, keeping the paging numbers.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            limit: self.limit,
            offset: self.offset,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
