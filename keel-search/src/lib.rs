//! # keel-search
//!
//! Allow-listed search, filtering and pagination over resource collections.
//!
//! Untrusted listing parameters go through three stages:
//!
//! 1. **Resolve** ([`FieldResolver`]): every field name is checked against
//!    the resource's allow-list and mapped to its storage column.
//! 2. **Parse** ([`parse_filter`], [`parse_sort`], [`SearchParams`]): the
//!    filter string becomes a typed [`Predicate`] tree, the sort string a
//!    [`SortSpec`]. Errors surface here, before any storage access.
//! 3. **Execute** ([`SearchEngine`]): one bounded page query plus one count
//!    query with the same predicate, against a [`Collection`]. Literals stay
//!    typed parameters all the way down.
//!
//! # Example
//!
//! ```rust,ignore
//! let resolver = FieldResolver::new(["id", "created", "updated", "name", "email"])?;
//! let page = SearchEngine::default()
//!     .search(&ctx, &admins, &resolver, "filter=name~'ac'&sort=-created&limit=20")
//!     .await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod filter;
mod lexer;
pub mod page;
pub mod params;
pub mod query;
pub mod resolver;
pub mod sort;
pub mod store;
pub mod value;

pub use config::SearchConfig;
pub use engine::SearchEngine;
pub use filter::{CmpOp, Comparison, Predicate, parse_filter, parse_filter_with};
pub use page::{PageRequest, PageResult};
pub use params::{ParsedSearch, SearchParams};
pub use query::{CountQuery, SelectQuery, SqlStatement};
pub use resolver::{FieldDef, FieldKind, FieldResolver, FieldResolverBuilder, ResolvedField};
pub use sort::{Direction, SortField, SortSpec, parse_sort, parse_sort_with};
pub use store::{Collection, MemoryCollection, Row};
pub use value::Value;
