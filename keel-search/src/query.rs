//! Bounded queries handed to a [`Collection`](crate::store::Collection).
//!
//! A listing is two queries over the same predicate: a [`SelectQuery`] for
//! the page and a [`CountQuery`] for the total. Stores either interpret them
//! directly (see [`MemoryCollection`](crate::store::MemoryCollection)) or
//! render them with [`SelectQuery::to_sql`], which keeps every literal in the
//! parameter list.

use crate::{
    filter::{CmpOp, Predicate},
    sort::SortSpec,
    value::Value,
};
use std::fmt::Write;

/// The page query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// Collection name.
    pub collection: String,
    /// Row filter.
    pub predicate: Predicate,
    /// Row order.
    pub sort: SortSpec,
    /// Page size; always bounded.
    pub limit: u64,
    /// Rows to skip.
    pub offset: u64,
}

/// The total-count query. Shares the page query's predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    /// Collection name.
    pub collection: String,
    /// Row filter.
    pub predicate: Predicate,
}

/// Parameterized SQL: placeholders are `?`, bound in order from `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// Statement text.
    pub sql: String,
    /// Bound literals.
    pub params: Vec<Value>,
}

impl SelectQuery {
    /// The count query over the same collection and predicate.
    pub fn count_query(&self) -> CountQuery {
        CountQuery {
            collection: self.collection.clone(),
            predicate: self.predicate.clone(),
        }
    }

    /// Render as `SELECT * FROM ... WHERE ... ORDER BY ... LIMIT n OFFSET m`.
    pub fn to_sql(&self) -> SqlStatement {
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.collection));
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, &self.predicate);

        if !self.sort.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, key) in self.sort.fields().iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let _ = write!(
                    sql,
                    "{} {}",
                    quote_ident(key.field.column()),
                    key.direction.as_sql()
                );
            }
        }

        let _ = write!(sql, " LIMIT {} OFFSET {}", self.limit, self.offset);
        SqlStatement { sql, params }
    }
}

impl CountQuery {
    /// Render as `SELECT COUNT(*) FROM ... WHERE ...`.
    pub fn to_sql(&self) -> SqlStatement {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.collection));
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, &self.predicate);
        SqlStatement { sql, params }
    }
}

fn push_where(sql: &mut String, params: &mut Vec<Value>, predicate: &Predicate) {
    if !predicate.is_all() {
        sql.push_str(" WHERE ");
        render(sql, params, predicate);
    }
}

fn render(sql: &mut String, params: &mut Vec<Value>, predicate: &Predicate) {
    match predicate {
        Predicate::All => sql.push_str("1 = 1"),
        Predicate::Compare(cmp) => {
            let column = quote_ident(cmp.field.column());
            match (&cmp.value, cmp.op) {
                (Value::Null, CmpOp::Eq) => {
                    let _ = write!(sql, "{column} IS NULL");
                }
                (Value::Null, _) => {
                    let _ = write!(sql, "{column} IS NOT NULL");
                }
                (value, CmpOp::Like) => {
                    let pattern = like_pattern(value.as_text().unwrap_or_default());
                    let _ = write!(sql, "{column} LIKE ? ESCAPE '\\'");
                    params.push(Value::Text(pattern));
                }
                (value, op) => {
                    let _ = write!(sql, "{column} {} ?", sql_op(op));
                    params.push(value.clone());
                }
            }
        }
        Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
            let joiner = if matches!(predicate, Predicate::And(..)) {
                " AND "
            } else {
                " OR "
            };
            sql.push('(');
            render(sql, params, lhs);
            sql.push_str(joiner);
            render(sql, params, rhs);
            sql.push(')');
        }
        Predicate::Not(inner) => {
            sql.push_str("NOT (");
            render(sql, params, inner);
            sql.push(')');
        }
    }
}

fn sql_op(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Ne => "<>",
        other => other.as_str(),
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// The LIKE pattern for a `~` literal: used as given when it contains an
/// unescaped `%`, otherwise wrapped as `%value%`.
pub fn like_pattern(value: &str) -> String {
    if has_wildcard(value) {
        value.to_string()
    } else {
        format!("%{value}%")
    }
}

fn has_wildcard(value: &str) -> bool {
    let mut escaped = false;
    for ch in value.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '%' => return true,
            _ => {}
        }
    }
    false
}

/// Escape LIKE metacharacters so `value` only matches itself.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
