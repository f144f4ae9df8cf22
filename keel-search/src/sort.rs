//! Sort expressions.
//!
//! `-created,name` sorts by `created` descending, then `name` ascending.
//! A leading `+` is accepted and means ascending.

use crate::{
    config::SearchConfig,
    resolver::{FieldResolver, ResolvedField},
};
use keel_core::KeelError;
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// The resolved field.
    pub field: ResolvedField,
    /// The direction.
    pub direction: Direction,
}

/// An ordered list of sort keys. Empty means storage order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec(Vec<SortField>);

impl SortSpec {
    /// No ordering.
    pub fn none() -> Self {
        Self::default()
    }

    /// Append a key.
    pub fn then(mut self, field: ResolvedField, direction: Direction) -> Self {
        self.0.push(SortField { field, direction });
        self
    }

    /// The keys, most significant first.
    pub fn fields(&self) -> &[SortField] {
        &self.0
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if key.direction == Direction::Desc {
                f.write_str("-")?;
            }
            f.write_str(key.field.name())?;
        }
        Ok(())
    }
}

/// Parse a comma separated sort expression with the default limits.
pub fn parse_sort(resolver: &FieldResolver, raw: &str) -> Result<SortSpec, KeelError> {
    parse_sort_with(resolver, raw, &SearchConfig::default())
}

/// Parse a sort expression, allowing at most `config.max_sort_fields` keys.
pub fn parse_sort_with(
    resolver: &FieldResolver,
    raw: &str,
    config: &SearchConfig,
) -> Result<SortSpec, KeelError> {
    if raw.trim().is_empty() {
        return Ok(SortSpec::none());
    }

    let mut spec = SortSpec::none();
    let mut offset = 0;
    for part in raw.split(',') {
        let at = offset;
        offset += part.len() + 1;

        let item = part.trim();
        let (direction, name) = match item.as_bytes().first() {
            Some(b'-') => (Direction::Desc, &item[1..]),
            Some(b'+') => (Direction::Asc, &item[1..]),
            Some(_) => (Direction::Asc, item),
            None => return Err(KeelError::invalid_filter_at("empty sort key", part, at)),
        };

        let field = resolver.lookup(name).map_err(|err| match err {
            KeelError::UnknownField(name) => KeelError::UnknownField(name),
            _ => KeelError::invalid_filter_at("invalid sort field", part, at),
        })?;
        if !field.is_sortable() {
            return Err(KeelError::invalid_filter_at(
                format!("field `{name}` is not sortable"),
                part,
                at,
            ));
        }
        if spec.0.iter().any(|key| key.field.name() == name) {
            return Err(KeelError::invalid_filter_at(
                format!("field `{name}` is sorted twice"),
                part,
                at,
            ));
        }
        if spec.len() == config.max_sort_fields {
            return Err(KeelError::invalid_filter(format!(
                "sort names more than {} fields",
                config.max_sort_fields
            )));
        }

        spec = spec.then(field.clone(), direction);
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FieldDef;
    use keel_core::ErrorKind;

    fn resolver() -> FieldResolver {
        FieldResolver::builder()
            .field(FieldDef::any("id"))
            .field(FieldDef::datetime("created").column("created_at"))
            .field(FieldDef::text("name"))
            .field(FieldDef::text("bio").sortable(false))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_directions() {
        let spec = parse_sort(&resolver(), "-created, +name,id").unwrap();
        let keys: Vec<_> = spec
            .fields()
            .iter()
            .map(|key| (key.field.column(), key.direction))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("created_at", Direction::Desc),
                ("name", Direction::Asc),
                ("id", Direction::Asc),
            ]
        );
        assert_eq!(spec.to_string(), "-created,name,id");
    }

    #[test]
    fn test_empty_sort() {
        assert!(parse_sort(&resolver(), "").unwrap().is_empty());
        assert!(parse_sort(&resolver(), "  ").unwrap().is_empty());
    }

    #[test]
    fn test_rejections() {
        let r = resolver();
        assert_eq!(parse_sort(&r, "-password").unwrap_err().kind(), ErrorKind::UnknownField);
        for bad in ["name,,id", "name,", "-", "name.x", "bio", "name,-name", "name desc"] {
            assert_eq!(parse_sort(&r, bad).unwrap_err().kind(), ErrorKind::InvalidFilter, "{bad}");
        }
    }

    #[test]
    fn test_field_limit() {
        let r = FieldResolver::new(["a", "b", "c"]).unwrap();
        let config = SearchConfig {
            max_sort_fields: 2,
            ..SearchConfig::default()
        };
        assert!(parse_sort_with(&r, "a,b", &config).is_ok());
        assert!(parse_sort_with(&r, "a,b,c", &config).is_err());
    }
}
