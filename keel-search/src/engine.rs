//! # Query Execution Engine
//!
//! Turns a validated predicate, sort and page request into one bounded
//! listing.
//!
//! The page and the total are two independent queries with the same
//! predicate, issued concurrently and without a spanning transaction. Under
//! concurrent writes the total may disagree with the rows by the writes that
//! landed in between; callers that need exact agreement must serialize
//! writes themselves.

use crate::{
    config::SearchConfig,
    filter::Predicate,
    page::{PageRequest, PageResult},
    params::SearchParams,
    query::SelectQuery,
    resolver::FieldResolver,
    sort::SortSpec,
    store::Collection,
};
use futures::{FutureExt, future::try_join};
use keel_core::{KeelError, OperationContext};
use tracing::Instrument;

/// Executes listings against [`Collection`]s.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    /// An engine with the given limits.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// The engine's limits.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the page query without running it.
    pub fn plan<C: Collection + ?Sized>(
        &self,
        collection: &C,
        predicate: Predicate,
        sort: SortSpec,
        page: &PageRequest,
    ) -> SelectQuery {
        SelectQuery {
            collection: collection.name().to_string(),
            predicate,
            sort,
            limit: page.effective_limit(&self.config),
            offset: page.effective_offset(),
        }
    }

    /// Fetch one page and the total count.
    ///
    /// Runs under `ctx`: cancellation and deadline abort both queries and
    /// surface as [`KeelError::Cancelled`] / [`KeelError::Timeout`]. Store
    /// failures surface as [`KeelError::ExecutionFailed`]; nothing is retried.
    pub async fn execute<C: Collection + ?Sized>(
        &self,
        ctx: &OperationContext,
        collection: &C,
        predicate: Predicate,
        sort: SortSpec,
        page: &PageRequest,
    ) -> Result<PageResult<C::Item>, KeelError> {
        let select = self.plan(collection, predicate, sort, page);
        let count = select.count_query();
        let span = tracing::debug_span!(
            "search",
            collection = %select.collection,
            limit = select.limit,
            offset = select.offset,
        );

        let result = ctx
            .run(async {
                let fetch = collection.fetch(&select).map(|r| r.map_err(KeelError::execution));
                let total = collection.count(&count).map(|r| r.map_err(KeelError::execution));
                try_join(fetch, total).await
            })
            .instrument(span)
            .await;

        match result {
            Ok((items, total)) => {
                tracing::debug!(
                    collection = %select.collection,
                    returned = items.len(),
                    total,
                    "search executed"
                );
                Ok(PageResult::new(items, select.limit, select.offset, total))
            }
            Err(err) => {
                tracing::warn!(collection = %select.collection, error = %err, "search failed");
                Err(err)
            }
        }
    }

    /// Parse a raw query string against `resolver` and execute it.
    ///
    /// Parse errors are returned before the collection is touched.
    pub async fn search<C: Collection + ?Sized>(
        &self,
        ctx: &OperationContext,
        collection: &C,
        resolver: &FieldResolver,
        raw_query: &str,
    ) -> Result<PageResult<C::Item>, KeelError> {
        let parsed = SearchParams::from_query(raw_query)?.parse(resolver, &self.config)?;
        self.execute(ctx, collection, parsed.predicate, parsed.sort, &parsed.page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCollection;
    use keel_core::ErrorKind;
    use serde_json::json;

    fn numbered(n: usize) -> MemoryCollection {
        let rows = MemoryCollection::new("rows");
        for i in 0..n {
            rows.insert_json(json!({"id": i, "even": i % 2 == 0}));
        }
        rows
    }

    #[tokio::test]
    async fn test_default_limit() {
        let engine = SearchEngine::default();
        let page = engine
            .execute(
                &OperationContext::new(),
                &numbered(45),
                Predicate::All,
                SortSpec::none(),
                &PageRequest::new(0, 0),
            )
            .await
            .unwrap();

        assert_eq!(page.limit, 30);
        assert_eq!(page.items.len(), 30);
        assert_eq!(page.total_items, 45);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_search_parses_first() {
        let engine = SearchEngine::default();
        let resolver = FieldResolver::new(["id", "even"]).unwrap();

        let page = engine
            .search(&OperationContext::new(), &numbered(10), &resolver, "filter=even%3Dtrue&sort=-id&limit=2")
            .await
            .unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.items[0]["id"], 8);

        let err = engine
            .search(&OperationContext::new(), &numbered(10), &resolver, "filter=odd%3Dtrue")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let ctx = OperationContext::new();
        ctx.cancel();
        let err = SearchEngine::default()
            .execute(&ctx, &numbered(3), Predicate::All, SortSpec::none(), &PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
