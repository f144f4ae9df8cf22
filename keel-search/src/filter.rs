//! # Filter Expressions
//!
//! Parses untrusted filter strings into a [`Predicate`] tree.
//!
//! ```text
//! filter     := or?
//! or         := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!" unary | primary
//! primary    := "(" or ")" | comparison
//! comparison := field op literal
//! op         := "=" | "!=" | ">" | ">=" | "<" | "<=" | "~"
//! literal    := string | number | "true" | "false" | "null"
//! ```
//!
//! Every field is resolved while parsing, so a [`Predicate`] only ever holds
//! allow-listed fields. Literals are checked against the field's
//! [`FieldKind`] and later bound as parameters, never spliced into a query.

use crate::{
    config::SearchConfig,
    lexer::{Token, TokenKind, tokenize},
    resolver::{FieldKind, FieldResolver, ResolvedField},
    value::Value,
};
use keel_core::KeelError;
use std::fmt;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `~`, a LIKE match. Without a `%` in the pattern it matches substrings.
    Like,
}

impl CmpOp {
    /// The operator as written in a filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Like => "~",
        }
    }

    /// Whether this is one of `>`, `>=`, `<`, `<=`.
    pub fn is_ordering(&self) -> bool {
        matches!(self, CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte)
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `field op literal` leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// The resolved field.
    pub field: ResolvedField,
    /// The operator.
    pub op: CmpOp,
    /// The literal, bound as a parameter.
    pub value: Value,
}

/// A boolean filter over a collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// Matches every row. The result of an empty filter.
    #[default]
    All,
    /// A single comparison.
    Compare(Comparison),
    /// Both sides must match.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side must match.
    Or(Box<Predicate>, Box<Predicate>),
    /// The inner predicate must not match.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Conjunction. `All` is the identity.
    pub fn and(self, rhs: Predicate) -> Predicate {
        match (self, rhs) {
            (Predicate::All, other) | (other, Predicate::All) => other,
            (lhs, rhs) => Predicate::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Disjunction. `All` absorbs the other side.
    pub fn or(self, rhs: Predicate) -> Predicate {
        match (self, rhs) {
            (Predicate::All, _) | (_, Predicate::All) => Predicate::All,
            (lhs, rhs) => Predicate::Or(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Whether this is the match-everything predicate.
    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// Nesting depth of the tree; a comparison has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::All => 0,
            Predicate::Compare(_) => 1,
            Predicate::Not(inner) => 1 + inner.depth(),
            Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => 1 + lhs.depth().max(rhs.depth()),
        }
    }

    /// All comparisons, left to right.
    pub fn comparisons(&self) -> Vec<&Comparison> {
        fn walk<'p>(predicate: &'p Predicate, out: &mut Vec<&'p Comparison>) {
            match predicate {
                Predicate::All => {}
                Predicate::Compare(cmp) => out.push(cmp),
                Predicate::Not(inner) => walk(inner, out),
                Predicate::And(lhs, rhs) | Predicate::Or(lhs, rhs) => {
                    walk(lhs, out);
                    walk(rhs, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    fn precedence(&self) -> u8 {
        match self {
            Predicate::Or(..) => 1,
            Predicate::And(..) => 2,
            Predicate::All | Predicate::Compare(_) | Predicate::Not(_) => 3,
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            f.write_str("(")?;
            self.fmt_at(f, 0)?;
            return f.write_str(")");
        }

        match self {
            Predicate::All => Ok(()),
            Predicate::Compare(cmp) => {
                write!(f, "{} {} {}", cmp.field.name(), cmp.op, cmp.value)
            }
            Predicate::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_at(f, 3)
            }
            Predicate::And(lhs, rhs) => {
                lhs.fmt_at(f, 2)?;
                f.write_str(" && ")?;
                rhs.fmt_at(f, 3)
            }
            Predicate::Or(lhs, rhs) => {
                lhs.fmt_at(f, 1)?;
                f.write_str(" || ")?;
                rhs.fmt_at(f, 2)
            }
        }
    }
}

impl fmt::Display for Predicate {
    /// Canonical filter text. Parsing it back yields an equal predicate.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

/// Parse `raw` with the default limits.
///
/// An empty or blank filter is [`Predicate::All`].
///
/// # Example
///
/// ```rust
/// use keel_search::{FieldResolver, Predicate, parse_filter};
///
/// let resolver = FieldResolver::new(["id", "name", "email"]).unwrap();
/// let predicate = parse_filter(&resolver, r#"name = "acme" && id != "x""#).unwrap();
/// assert!(matches!(predicate, Predicate::And(..)));
/// ```
pub fn parse_filter(resolver: &FieldResolver, raw: &str) -> Result<Predicate, KeelError> {
    parse_filter_with(resolver, raw, &SearchConfig::default())
}

/// Parse `raw` with the length and depth limits of `config`.
pub fn parse_filter_with(
    resolver: &FieldResolver,
    raw: &str,
    config: &SearchConfig,
) -> Result<Predicate, KeelError> {
    if raw.len() > config.max_filter_length {
        return Err(KeelError::invalid_filter(format!(
            "filter is longer than {} bytes",
            config.max_filter_length
        )));
    }

    let tokens = tokenize(raw)?;
    if tokens.is_empty() {
        return Ok(Predicate::All);
    }

    let mut parser = Parser {
        input: raw,
        tokens: &tokens,
        pos: 0,
        depth: 0,
        max_depth: config.max_filter_depth,
        resolver,
    };
    let predicate = parser.parse_or()?;

    match parser.peek() {
        None => Ok(predicate),
        Some(token) => Err(parser.unexpected(token, "expected `&&`, `||` or end of filter")),
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    resolver: &'a FieldResolver,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn fragment(&self, token: &Token) -> &'a str {
        &self.input[token.offset..token.offset + token.len]
    }

    fn unexpected(&self, token: &Token, reason: &str) -> KeelError {
        KeelError::invalid_filter_at(reason, self.fragment(token), token.offset)
    }

    fn end_of_input(&self, reason: &str) -> KeelError {
        KeelError::invalid_filter(format!("{reason}, found end of filter"))
    }

    fn descend(&mut self, token: &Token) -> Result<(), KeelError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.unexpected(
                token,
                &format!("filter nests deeper than {} levels", self.max_depth),
            ));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Predicate, KeelError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token { kind: TokenKind::Or, .. })) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Predicate::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Predicate, KeelError> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token { kind: TokenKind::And, .. })) {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Predicate::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Predicate, KeelError> {
        let token = self
            .peek()
            .ok_or_else(|| self.end_of_input("expected a comparison"))?;

        match token.kind {
            TokenKind::Bang => {
                self.pos += 1;
                self.descend(token)?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(Predicate::Not(Box::new(inner)))
            }
            TokenKind::LParen => {
                self.pos += 1;
                self.descend(token)?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(self.unexpected(other, "expected `)`")),
                    None => Err(self.end_of_input("expected `)`")),
                }
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Predicate, KeelError> {
        let field_token = self
            .bump()
            .ok_or_else(|| self.end_of_input("expected a field name"))?;
        let name = match &field_token.kind {
            TokenKind::Ident(name) => name,
            _ => return Err(self.unexpected(field_token, "expected a field name")),
        };
        let field = self.resolver.lookup(name).map_err(|err| match err {
            KeelError::UnknownField(name) => KeelError::UnknownField(name),
            _ => self.unexpected(field_token, "invalid field name"),
        })?;

        let op = match self.bump() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => *op,
            Some(other) => return Err(self.unexpected(other, "expected a comparison operator")),
            None => return Err(self.end_of_input("expected a comparison operator")),
        };

        let literal_token = self
            .bump()
            .ok_or_else(|| self.end_of_input("expected a literal"))?;
        let value = match &literal_token.kind {
            TokenKind::Str(text) => Value::Text(text.clone()),
            TokenKind::Num(number) => Value::Number(*number),
            TokenKind::Ident(word) if word == "true" => Value::Bool(true),
            TokenKind::Ident(word) if word == "false" => Value::Bool(false),
            TokenKind::Ident(word) if word == "null" => Value::Null,
            _ => return Err(self.unexpected(literal_token, "expected a literal")),
        };

        if let Some(reason) = incompatibility(field, op, &value) {
            let start = field_token.offset;
            let end = literal_token.offset + literal_token.len;
            return Err(KeelError::invalid_filter_at(
                reason,
                &self.input[start..end],
                start,
            ));
        }

        Ok(Predicate::Compare(Comparison {
            field: field.clone(),
            op,
            value,
        }))
    }
}

/// Why `field op value` is not allowed, if it is not.
fn incompatibility(field: &ResolvedField, op: CmpOp, value: &Value) -> Option<String> {
    let name = field.name();
    let kind = field.kind();

    if value.is_null() {
        return (!matches!(op, CmpOp::Eq | CmpOp::Ne))
            .then(|| format!("`{op}` cannot compare `{name}` with null"));
    }

    if op == CmpOp::Like {
        if !matches!(kind, FieldKind::Text | FieldKind::Any) {
            return Some(format!("`~` is not supported for {kind} field `{name}`"));
        }
        return value
            .as_text()
            .is_none()
            .then(|| format!("`~` on `{name}` needs a string pattern"));
    }

    let accepted = match kind {
        FieldKind::Any => !(op.is_ordering() && matches!(value, Value::Bool(_))),
        FieldKind::Text | FieldKind::DateTime => matches!(value, Value::Text(_)),
        FieldKind::Number => matches!(value, Value::Number(_)),
        FieldKind::Bool => !op.is_ordering() && matches!(value, Value::Bool(_)),
    };

    (!accepted).then(|| {
        format!(
            "`{op}` with a {} literal is not supported for {kind} field `{name}`",
            value.type_name()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FieldDef;
    use keel_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn admins() -> FieldResolver {
        FieldResolver::new(["id", "created", "updated", "name", "email"]).unwrap()
    }

    fn typed() -> FieldResolver {
        FieldResolver::builder()
            .field(FieldDef::text("name"))
            .field(FieldDef::number("age"))
            .field(FieldDef::boolean("active"))
            .field(FieldDef::datetime("created"))
            .build()
            .unwrap()
    }

    fn cmp(resolver: &FieldResolver, name: &str, op: CmpOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare(Comparison {
            field: resolver.resolve(name).unwrap().clone(),
            op,
            value: value.into(),
        })
    }

    #[test]
    fn test_and_of_two_comparisons() {
        let resolver = admins();
        let predicate = parse_filter(&resolver, r#"name = "acme" && id != "x""#).unwrap();

        assert_eq!(
            predicate,
            cmp(&resolver, "name", CmpOp::Eq, "acme").and(cmp(&resolver, "id", CmpOp::Ne, "x"))
        );
    }

    #[test]
    fn test_unknown_field() {
        let err = parse_filter(&admins(), r#"bogus = "x""#).unwrap_err();
        assert!(matches!(err, KeelError::UnknownField(ref name) if name == "bogus"));
    }

    #[test]
    fn test_unknown_field_deep_inside() {
        let err = parse_filter(&admins(), r#"id = 1 || (name = "a" && !(secret = 1))"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_dotted_field_is_invalid() {
        let err = parse_filter(&admins(), r#"name.length > 3"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert_eq!(parse_filter(&admins(), "").unwrap(), Predicate::All);
        assert_eq!(parse_filter(&admins(), "   ").unwrap(), Predicate::All);
    }

    #[test]
    fn test_precedence() {
        let r = admins();
        // a || b && c  ==  a || (b && c)
        let predicate = parse_filter(&r, "id = 1 || id = 2 && id = 3").unwrap();
        assert_eq!(
            predicate,
            cmp(&r, "id", CmpOp::Eq, 1_i64)
                .or(cmp(&r, "id", CmpOp::Eq, 2_i64).and(cmp(&r, "id", CmpOp::Eq, 3_i64)))
        );

        // ! binds to the next comparison only
        let predicate = parse_filter(&r, "!id = 1 && id = 2").unwrap();
        assert_eq!(
            predicate,
            cmp(&r, "id", CmpOp::Eq, 1_i64)
                .not()
                .and(cmp(&r, "id", CmpOp::Eq, 2_i64))
        );

        // parentheses override
        let predicate = parse_filter(&r, "(id = 1 || id = 2) && id = 3").unwrap();
        assert_eq!(
            predicate,
            cmp(&r, "id", CmpOp::Eq, 1_i64)
                .or(cmp(&r, "id", CmpOp::Eq, 2_i64))
                .and(cmp(&r, "id", CmpOp::Eq, 3_i64))
        );
    }

    #[test]
    fn test_chains_are_left_associative() {
        let r = admins();
        let predicate = parse_filter(&r, "id = 1 && id = 2 && id = 3").unwrap();
        assert_eq!(
            predicate,
            cmp(&r, "id", CmpOp::Eq, 1_i64)
                .and(cmp(&r, "id", CmpOp::Eq, 2_i64))
                .and(cmp(&r, "id", CmpOp::Eq, 3_i64))
        );
    }

    #[test]
    fn test_literal_kinds() {
        let r = typed();
        assert!(parse_filter(&r, "age >= 18 && active = true").is_ok());
        assert!(parse_filter(&r, r#"created > "2024-01-01 00:00:00""#).is_ok());
        assert!(parse_filter(&r, r#"name ~ "ac%""#).is_ok());
        assert!(parse_filter(&r, "name = null && age != null").is_ok());

        for bad in [
            "active > true",
            r#"active = "yes""#,
            r#"age > "ten""#,
            "name = 3",
            "created ~ \"2024\"",
            "age ~ 1",
            "name > null",
            "name ~ 1",
        ] {
            let err = parse_filter(&r, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFilter, "{bad}");
        }
    }

    #[test]
    fn test_error_names_fragment() {
        let err = parse_filter(&typed(), "age = 1 && active > true").unwrap_err();
        match err {
            KeelError::InvalidFilter {
                fragment, offset, ..
            } => {
                assert_eq!(fragment.as_deref(), Some("active > true"));
                assert_eq!(offset, Some(11));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_syntax() {
        let r = admins();
        for bad in [
            "id =",
            "id 1",
            "= 1",
            "(id = 1",
            "id = 1)",
            "id = 1 &&",
            "id = 1 id = 2",
            "id = name",
            "()",
            "!",
        ] {
            let err = parse_filter(&r, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFilter, "{bad}");
        }
    }

    #[test]
    fn test_depth_limit() {
        let r = admins();
        let nested = format!("{}id = 1{}", "(".repeat(32), ")".repeat(32));
        assert!(parse_filter(&r, &nested).is_ok());

        let too_deep = format!("{}id = 1{}", "(".repeat(33), ")".repeat(33));
        assert_eq!(
            parse_filter(&r, &too_deep).unwrap_err().kind(),
            ErrorKind::InvalidFilter
        );

        let negations = format!("{}id = 1", "!".repeat(10_000));
        assert_eq!(
            parse_filter_with(
                &r,
                &negations,
                &SearchConfig {
                    max_filter_length: 20_000,
                    ..SearchConfig::default()
                }
            )
            .unwrap_err()
            .kind(),
            ErrorKind::InvalidFilter
        );
    }

    #[test]
    fn test_length_limit() {
        let r = admins();
        let long = vec!["id = 1"; 600].join(" || ");
        assert_eq!(
            parse_filter(&r, &long).unwrap_err().kind(),
            ErrorKind::InvalidFilter
        );
    }

    #[test]
    fn test_display_round_trips() {
        let r = admins();
        for raw in [
            r#"name = "acme" && id != "x""#,
            "id = 1 || id = 2 && id = 3",
            "(id = 1 || id = 2) && !(id = 3 || id = 4)",
            "id = 1 && (id = 2 && id = 3)",
            "id = 1 || (id = 2 || id = 3)",
            r#"!!name ~ "a\"b\\c%" || email = null"#,
            "created >= -1.5",
        ] {
            let predicate = parse_filter(&r, raw).unwrap();
            let canonical = predicate.to_string();
            assert_eq!(parse_filter(&r, &canonical).unwrap(), predicate, "{raw}");
        }
    }

    #[test]
    fn test_canonical_text() {
        let r = admins();
        let predicate = parse_filter(&r, "(id=1||id='2')&&!(name~'x')").unwrap();
        assert_eq!(
            predicate.to_string(),
            r#"(id = 1 || id = "2") && !name ~ "x""#
        );
    }

    #[test]
    fn test_combinators() {
        let r = admins();
        let a = cmp(&r, "id", CmpOp::Eq, 1_i64);
        assert_eq!(Predicate::All.and(a.clone()), a);
        assert_eq!(a.clone().and(Predicate::All), a);
        assert_eq!(a.clone().or(Predicate::All), Predicate::All);
        assert_eq!(a.clone().and(a.clone()).depth(), 2);
        assert_eq!(a.clone().or(a.clone().not()).comparisons().len(), 2);
    }
}
