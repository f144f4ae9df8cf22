//! # Backing Stores
//!
//! The engine reaches storage only through [`Collection`]. A collection runs
//! a [`SelectQuery`] and a [`CountQuery`]; how is its own business (SQL via
//! [`SelectQuery::to_sql`], a document store, an in-memory vector).
//!
//! [`MemoryCollection`] evaluates queries over JSON rows with SQL semantics:
//! comparing with a missing or null column is unknown (the row is not
//! returned) except for `= null` / `!= null`; `~` is a case-insensitive LIKE;
//! nulls sort first.

use crate::{
    filter::{CmpOp, Comparison, Predicate},
    query::{CountQuery, SelectQuery, like_pattern},
    sort::{Direction, SortSpec},
    value::Value,
};
use async_trait::async_trait;
use keel_core::BoxError;
use std::{
    cmp::Ordering,
    sync::{PoisonError, RwLock},
};

/// A JSON object row.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A named collection the search engine can query.
///
/// Both methods may be called concurrently for the same listing. Failures
/// are reported as [`KeelError::ExecutionFailed`](keel_core::KeelError::ExecutionFailed)
/// and never retried.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Type of a returned row.
    type Item: Send;

    /// Collection name, used in queries and logs.
    fn name(&self) -> &str;

    /// Rows of one page.
    async fn fetch(&self, query: &SelectQuery) -> Result<Vec<Self::Item>, BoxError>;

    /// Number of rows matching the predicate, ignoring paging.
    async fn count(&self, query: &CountQuery) -> Result<u64, BoxError>;
}

/// An in-memory collection of JSON rows.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    name: String,
    rows: RwLock<Vec<Row>>,
}

impl MemoryCollection {
    /// An empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::default(),
        }
    }

    /// Append a row.
    pub fn insert(&self, row: Row) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    /// Append a JSON value if it is an object. Returns whether it was added.
    pub fn insert_json(&self, value: serde_json::Value) -> bool {
        match value {
            serde_json::Value::Object(row) => {
                self.insert(row);
                true
            }
            _ => false,
        }
    }

    /// Delete rows matching `predicate`; returns how many were removed.
    pub fn remove_where(&self, predicate: &Predicate) -> usize {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|row| evaluate(predicate, row) != Some(true));
        before - rows.len()
    }

    /// Whether any row matches `predicate`.
    pub fn any(&self, predicate: &Predicate) -> bool {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|row| evaluate(predicate, row) == Some(true))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    type Item = serde_json::Value;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SelectQuery) -> Result<Vec<serde_json::Value>, BoxError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| evaluate(&query.predicate, row) == Some(true))
            .collect();
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &query.sort));
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| serde_json::Value::Object(row.clone()))
            .collect())
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, BoxError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let count = rows
            .iter()
            .filter(|row| evaluate(&query.predicate, row) == Some(true))
            .count();
        Ok(count as u64)
    }
}

fn column_value(row: &Row, column: &str) -> Value {
    row.get(column).map_or(Value::Null, Value::from_json)
}

/// Three-valued evaluation; `None` is SQL's unknown.
fn evaluate(predicate: &Predicate, row: &Row) -> Option<bool> {
    match predicate {
        Predicate::All => Some(true),
        Predicate::Compare(cmp) => compare(cmp, row),
        Predicate::Not(inner) => evaluate(inner, row).map(|b| !b),
        Predicate::And(lhs, rhs) => match (evaluate(lhs, row), evaluate(rhs, row)) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        Predicate::Or(lhs, rhs) => match (evaluate(lhs, row), evaluate(rhs, row)) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    }
}

fn compare(cmp: &Comparison, row: &Row) -> Option<bool> {
    let actual = column_value(row, cmp.field.column());

    match (&cmp.value, cmp.op) {
        (Value::Null, CmpOp::Eq) => Some(actual.is_null()),
        (Value::Null, _) => Some(!actual.is_null()),
        _ if actual.is_null() => None,
        (literal, CmpOp::Like) => {
            let text = match &actual {
                Value::Text(text) => text.clone(),
                other => other.to_string(),
            };
            Some(like_match(&like_pattern(literal.as_text()?), &text))
        }
        (literal, op) => {
            let ord = actual.storage_cmp(literal);
            Some(match op {
                CmpOp::Eq => ord.is_eq(),
                CmpOp::Ne => ord.is_ne(),
                CmpOp::Gt => ord.is_gt(),
                CmpOp::Gte => ord.is_ge(),
                CmpOp::Lt => ord.is_lt(),
                CmpOp::Lte => ord.is_le(),
                CmpOp::Like => false,
            })
        }
    }
}

fn compare_rows(a: &Row, b: &Row, sort: &SortSpec) -> Ordering {
    for key in sort.fields() {
        let column = key.field.column();
        let ord = column_value(a, column).storage_cmp(&column_value(b, column));
        let ord = match key.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord.is_ne() {
            return ord;
        }
    }
    Ordering::Equal
}

enum LikeToken {
    Many,
    One,
    Char(char),
}

/// Case-insensitive (ASCII) LIKE with `\` as escape.
fn like_match(pattern: &str, text: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        tokens.push(match ch {
            '%' => LikeToken::Many,
            '_' => LikeToken::One,
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\').to_ascii_lowercase()),
            c => LikeToken::Char(c.to_ascii_lowercase()),
        });
    }
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::Many) => {
                p += 1;
                backtrack = Some((p, t));
            }
            Some(LikeToken::One) => {
                p += 1;
                t += 1;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((resume, from)) => {
                    p = resume;
                    t = from + 1;
                    backtrack = Some((resume, from + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| matches!(token, LikeToken::Many))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::parse_filter,
        resolver::{FieldDef, FieldResolver},
        sort::parse_sort,
    };
    use serde_json::json;

    fn people() -> MemoryCollection {
        let people = MemoryCollection::new("people");
        for row in [
            json!({"id": "1", "name": "Ada", "age": 36, "active": true}),
            json!({"id": "2", "name": "grace", "age": 45, "active": false}),
            json!({"id": "3", "name": "Linus", "age": null, "active": true}),
            json!({"id": "4", "name": "50%_off", "active": true}),
        ] {
            assert!(people.insert_json(row));
        }
        people
    }

    fn resolver() -> FieldResolver {
        FieldResolver::builder()
            .field(FieldDef::text("id"))
            .field(FieldDef::text("name"))
            .field(FieldDef::number("age"))
            .field(FieldDef::boolean("active"))
            .build()
            .unwrap()
    }

    async fn ids(filter: &str, sort: &str) -> Vec<String> {
        let r = resolver();
        let query = SelectQuery {
            collection: "people".into(),
            predicate: parse_filter(&r, filter).unwrap(),
            sort: parse_sort(&r, sort).unwrap(),
            limit: 100,
            offset: 0,
        };
        people()
            .fetch(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_comparisons() {
        assert_eq!(ids("age > 40", "").await, vec!["2"]);
        assert_eq!(ids("active = true", "").await, vec!["1", "3", "4"]);
        assert_eq!(ids("age != 36", "").await, vec!["2"]);
    }

    #[tokio::test]
    async fn test_null_semantics() {
        assert_eq!(ids("age = null", "").await, vec!["3", "4"]);
        assert_eq!(ids("age != null", "").await, vec!["1", "2"]);
        // unknown is neither true nor false
        assert_eq!(ids("!(age > 40)", "").await, vec!["1"]);
    }

    #[tokio::test]
    async fn test_like() {
        assert_eq!(ids(r#"name ~ "a""#, "").await, vec!["1", "2"]);
        assert_eq!(ids(r#"name ~ "GR%""#, "").await, vec!["2"]);
        assert_eq!(ids(r#"name ~ "%s""#, "").await, vec!["3"]);
        assert_eq!(ids(r#"name ~ "50\\%\\_%""#, "").await, vec!["4"]);
        assert_eq!(ids(r#"name ~ "l_nus""#, "").await, vec!["3"]);
    }

    #[tokio::test]
    async fn test_sort_and_window() {
        assert_eq!(ids("", "-age,id").await, vec!["2", "1", "3", "4"]);
        assert_eq!(ids("", "name").await, vec!["4", "1", "3", "2"]);

        let r = resolver();
        let query = SelectQuery {
            collection: "people".into(),
            predicate: Predicate::All,
            sort: parse_sort(&r, "id").unwrap(),
            limit: 2,
            offset: 1,
        };
        let rows = people().fetch(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "2");
        assert_eq!(people().count(&query.count_query()).await.unwrap(), 4);
    }

    #[test]
    fn test_remove_where() {
        let people = people();
        let predicate = parse_filter(&resolver(), "active = false").unwrap();
        assert!(people.any(&predicate));
        assert_eq!(people.remove_where(&predicate), 1);
        assert_eq!(people.len(), 3);
        assert!(!people.insert_json(json!([1, 2])));
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("%", ""));
        assert!(like_match("a%c", "abbbc"));
        assert!(!like_match("a%c", "abbbd"));
        assert!(like_match("%b%", "ABC"));
        assert!(!like_match("_", ""));
        assert!(like_match(r"100\%", "100%"));
        assert!(!like_match(r"100\%", "1000"));
    }
}
