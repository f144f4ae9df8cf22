//! # Field Resolver
//!
//! The allow-list of queryable attributes of one resource type.
//!
//! Filters and sorts never reach storage with a caller-supplied name: every
//! name is looked up here and replaced by the [`ResolvedField`] the resolver
//! was built with. Names that are not plain identifiers (dots, quotes,
//! brackets, whitespace) are rejected outright rather than merely not found.

use keel_core::KeelError;
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Type of a queryable field. Decides which operators and literals a
/// comparison may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    /// Untyped: any literal, `~` only with strings.
    #[default]
    Any,
    /// String column.
    Text,
    /// Numeric column.
    Number,
    /// Boolean column; equality only.
    Bool,
    /// Timestamp stored as sortable text.
    DateTime,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Any => "untyped",
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Bool => "boolean",
            FieldKind::DateTime => "datetime",
        })
    }
}

/// A field that passed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedField {
    name: String,
    column: String,
    kind: FieldKind,
    sortable: bool,
}

impl ResolvedField {
    /// The logical name callers use.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The storage column the name maps to.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The field's type.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field may appear in a sort expression.
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }
}

/// Definition of one allowed field, consumed by [`FieldResolverBuilder`].
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    column: Option<String>,
    kind: FieldKind,
    sortable: bool,
}

impl FieldDef {
    /// A field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind,
            sortable: true,
        }
    }

    /// An untyped field.
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    /// A string field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// A numeric field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// A boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    /// A timestamp field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    /// Store the field under a different column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Allow or forbid sorting by this field.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }
}

/// The allow-list of one resource type.
///
/// # Example
///
/// ```rust
/// use keel_search::FieldResolver;
///
/// let admins = FieldResolver::new(["id", "created", "updated", "name", "email"]).unwrap();
/// assert!(admins.resolve("email").is_some());
/// assert!(admins.resolve("password_hash").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FieldResolver {
    fields: HashMap<String, ResolvedField>,
    order: Vec<String>,
    search_field: Option<String>,
}

impl FieldResolver {
    /// An allow-list of untyped fields stored under their own names.
    pub fn new<I, S>(names: I) -> Result<Self, KeelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::builder(), |builder, name| builder.field(FieldDef::any(name)))
            .build()
    }

    /// Start building a typed allow-list.
    pub fn builder() -> FieldResolverBuilder {
        FieldResolverBuilder::default()
    }

    /// Look up an allowed field. Total: unknown or malformed names are `None`.
    pub fn resolve(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.get(name)
    }

    /// Look up a field, explaining the failure.
    ///
    /// Malformed names are an [`KeelError::InvalidFilter`]; well-formed names
    /// outside the allow-list are an [`KeelError::UnknownField`].
    pub fn lookup(&self, name: &str) -> Result<&ResolvedField, KeelError> {
        if !is_identifier(name) {
            return Err(KeelError::invalid_filter(format!(
                "`{name}` is not a valid field name"
            )));
        }
        self.resolve(name)
            .ok_or_else(|| KeelError::UnknownField(name.to_string()))
    }

    /// The field free-text search applies to, if any.
    pub fn search_field(&self) -> Option<&ResolvedField> {
        self.search_field
            .as_deref()
            .and_then(|name| self.fields.get(name))
    }

    /// Allowed names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of allowed fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is queryable.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder for [`FieldResolver`].
#[derive(Debug, Default)]
pub struct FieldResolverBuilder {
    defs: Vec<FieldDef>,
    search_field: Option<String>,
}

impl FieldResolverBuilder {
    /// Allow a field.
    pub fn field(mut self, def: FieldDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Make `name` the target of free-text search. It must be an allowed field.
    pub fn search_on(mut self, name: impl Into<String>) -> Self {
        self.search_field = Some(name.into());
        self
    }

    /// Validate the definitions.
    pub fn build(self) -> Result<FieldResolver, KeelError> {
        let mut fields = HashMap::with_capacity(self.defs.len());
        let mut order = Vec::with_capacity(self.defs.len());
        let mut columns = HashSet::with_capacity(self.defs.len());

        for def in self.defs {
            let column = def.column.unwrap_or_else(|| def.name.clone());
            for ident in [&def.name, &column] {
                if !is_identifier(ident) {
                    return Err(KeelError::InvalidConfig(format!(
                        "`{ident}` is not a valid field identifier"
                    )));
                }
            }
            if fields.contains_key(&def.name) {
                return Err(KeelError::InvalidConfig(format!(
                    "field `{}` is declared twice",
                    def.name
                )));
            }
            if !columns.insert(column.clone()) {
                return Err(KeelError::InvalidConfig(format!(
                    "field `{}` maps to column `{column}`, which another field already uses",
                    def.name
                )));
            }

            order.push(def.name.clone());
            fields.insert(
                def.name.clone(),
                ResolvedField {
                    name: def.name,
                    column,
                    kind: def.kind,
                    sortable: def.sortable,
                },
            );
        }

        if let Some(search) = &self.search_field {
            if !fields.contains_key(search) {
                return Err(KeelError::InvalidConfig(format!(
                    "search field `{search}` is not an allowed field"
                )));
            }
        }

        Ok(FieldResolver {
            fields,
            order,
            search_field: self.search_field,
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
