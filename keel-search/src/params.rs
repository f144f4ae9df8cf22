//! Query-string parameters of a listing request.

use crate::{
    config::SearchConfig,
    filter::{CmpOp, Comparison, Predicate, parse_filter_with},
    page::PageRequest,
    query::escape_like,
    resolver::FieldResolver,
    sort::{SortSpec, parse_sort_with},
    value::Value,
};
use keel_core::KeelError;
use serde::Deserialize;

/// The raw listing parameters: `?filter=...&sort=...&limit=...&offset=...&search=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Filter expression.
    pub filter: Option<String>,
    /// Sort expression.
    pub sort: Option<String>,
    /// Page size.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
    /// Free-text search term.
    pub search: Option<String>,
}

/// Parameters after validation against a resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSearch {
    /// Filter combined with the search term.
    pub predicate: Predicate,
    /// Sort keys.
    pub sort: SortSpec,
    /// Requested window.
    pub page: PageRequest,
}

impl SearchParams {
    /// Decode a url-encoded query string. Unknown keys are ignored.
    pub fn from_query(raw: &str) -> Result<Self, KeelError> {
        serde_urlencoded::from_str(raw.trim_start_matches('?'))
            .map_err(|err| KeelError::invalid_filter(format!("malformed query string: {err}")))
    }

    /// Validate every parameter against `resolver`.
    ///
    /// A non-blank search term becomes a prefix match (`term%`, with LIKE
    /// metacharacters escaped) on the resolver's search field and is AND-ed
    /// with the filter. Resolvers without a search field ignore the term.
    pub fn parse(
        &self,
        resolver: &FieldResolver,
        config: &SearchConfig,
    ) -> Result<ParsedSearch, KeelError> {
        let mut predicate =
            parse_filter_with(resolver, self.filter.as_deref().unwrap_or_default(), config)?;
        let sort = parse_sort_with(resolver, self.sort.as_deref().unwrap_or_default(), config)?;

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());
        if let Some(term) = search {
            match resolver.search_field() {
                Some(field) => {
                    predicate = predicate.and(Predicate::Compare(Comparison {
                        field: field.clone(),
                        op: CmpOp::Like,
                        value: Value::Text(format!("{}%", escape_like(term))),
                    }));
                }
                None => tracing::debug!(term, "search term ignored, no search field"),
            }
        }

        Ok(ParsedSearch {
            predicate,
            sort,
            page: PageRequest {
                limit: self.limit.unwrap_or(0),
                offset: self.offset.unwrap_or(0),
                search: search.map(str::to_string),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FieldDef;
    use keel_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn users() -> FieldResolver {
        FieldResolver::builder()
            .field(FieldDef::any("id"))
            .field(FieldDef::text("name"))
            .field(FieldDef::text("email"))
            .search_on("name")
            .build()
            .unwrap()
    }

    #[test]
    fn test_from_query() {
        let params = SearchParams::from_query(
            "?filter=name%20%3D%20%22acme%22&sort=-id&limit=4&offset=8&page=2",
        )
        .unwrap();
        assert_eq!(params.filter.as_deref(), Some(r#"name = "acme""#));
        assert_eq!(params.sort.as_deref(), Some("-id"));
        assert_eq!(params.limit, Some(4));
        assert_eq!(params.offset, Some(8));
    }

    #[test]
    fn test_malformed_limit() {
        let err = SearchParams::from_query("limit=ten").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_search_becomes_escaped_prefix_match() {
        let params = SearchParams {
            filter: Some(r#"email ~ "@acme.io""#.into()),
            search: Some(" 50%_ ".into()),
            ..SearchParams::default()
        };
        let parsed = params.parse(&users(), &SearchConfig::default()).unwrap();

        let comparisons = parsed.predicate.comparisons();
        assert_eq!(comparisons.len(), 2);
        assert_eq!(comparisons[1].field.name(), "name");
        assert_eq!(comparisons[1].value, Value::from(r"50\%\_%"));
        assert_eq!(parsed.page.search.as_deref(), Some("50%_"));
    }

    #[test]
    fn test_defaults() {
        let parsed = SearchParams::default()
            .parse(&users(), &SearchConfig::default())
            .unwrap();
        assert_eq!(parsed.predicate, Predicate::All);
        assert!(parsed.sort.is_empty());
        assert_eq!(parsed.page, PageRequest::default());
    }

    #[test]
    fn test_search_without_search_field() {
        let resolver = FieldResolver::new(["id"]).unwrap();
        let params = SearchParams {
            search: Some("x".into()),
            ..SearchParams::default()
        };
        assert!(params.parse(&resolver, &SearchConfig::default()).unwrap().predicate.is_all());
    }

    #[test]
    fn test_rejects_unknown_sort() {
        let params = SearchParams {
            sort: Some("password".into()),
            ..SearchParams::default()
        };
        assert_eq!(
            params.parse(&users(), &SearchConfig::default()).unwrap_err().kind(),
            ErrorKind::UnknownField
        );
    }
}
