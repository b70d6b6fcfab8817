//! Field values, field kinds and the field allow-list
//!
//! A [`FieldMap`] is the only way a client-supplied field name reaches a
//! query: names are resolved against it, values are coerced to the kind it
//! declares, and the query engines read entity values through its accessors.

use crate::core::error::QueryError;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` when either side is null or the kinds differ.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls come first
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

/// JSON text of the value, as it would appear in a filter payload
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", Value::String(s.clone())),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d.normalize()),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

impl From<Option<i16>> for FieldValue {
    fn from(value: Option<i16>) -> Self {
        value.map_or(FieldValue::Null, |v| FieldValue::Integer(i64::from(v)))
    }
}

impl From<Option<Decimal>> for FieldValue {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Decimal)
    }
}

/// Storage kind of a field, used to coerce filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Coerce a JSON filter value into a typed value of this kind
    pub fn coerce(&self, field: &str, value: &Value) -> Result<FieldValue, QueryError> {
        if value.is_null() {
            return Ok(FieldValue::Null);
        }

        let mismatch = || QueryError::TypeMismatch {
            field: field.to_string(),
            expected: self.name(),
            value: value.to_string(),
        };

        match self {
            FieldKind::Text => match value {
                Value::String(s) => Ok(FieldValue::String(s.clone())),
                Value::Number(n) => Ok(FieldValue::String(n.to_string())),
                Value::Bool(b) => Ok(FieldValue::String(b.to_string())),
                _ => Err(mismatch()),
            },
            FieldKind::Integer => match value {
                Value::Number(n) => n.as_i64().map(FieldValue::Integer).ok_or_else(mismatch),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            FieldKind::Decimal => {
                let text = match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.trim().to_string(),
                    _ => return Err(mismatch()),
                };
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(FieldValue::Decimal)
                    .map_err(|_| mismatch())
            }
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(FieldValue::Boolean(true)),
                    "false" => Ok(FieldValue::Boolean(false)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the allow-list
pub struct FieldDef<T> {
    /// Canonical name, used in rendered expressions
    pub name: &'static str,
    /// Column name for SQL backends
    pub column: &'static str,
    pub kind: FieldKind,
    /// Alternative names accepted from clients
    pub aliases: &'static [&'static str],
    /// Reads the field from an entity
    pub get: fn(&T) -> FieldValue,
}

impl<T> Clone for FieldDef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            column: self.column,
            kind: self.kind,
            aliases: self.aliases,
            get: self.get,
        }
    }
}

impl<T> fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Allow-list of the fields of `T` that clients may filter and sort on
///
/// Lookups are case-insensitive over canonical names and aliases.
///
/// # Example
///
/// ```rust,ignore
/// let fields = FieldMap::new("ProductID")
///     .field(FieldDef { name: "ProductID", column: "product_id", kind: FieldKind::Integer,
///                       aliases: &["id"], get: |p: &Product| FieldValue::Integer(p.product_id.into()) });
/// assert!(fields.get("productid").is_some());
/// ```
pub struct FieldMap<T> {
    key: &'static str,
    fields: IndexMap<String, FieldDef<T>>,
}

impl<T> FieldMap<T> {
    /// Create an empty allow-list whose unique key is `key`
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            fields: IndexMap::new(),
        }
    }

    /// Add a field (builder style)
    pub fn field(mut self, def: FieldDef<T>) -> Self {
        self.fields.insert(def.name.to_lowercase(), def);
        self
    }

    /// Canonical name of the unique key field
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Definition of the unique key field
    pub fn key_def(&self) -> Option<&FieldDef<T>> {
        self.get(self.key)
    }

    /// Resolve a client-supplied name
    pub fn get(&self, name: &str) -> Option<&FieldDef<T>> {
        let lowered = name.to_lowercase();
        self.fields.get(&lowered).or_else(|| {
            self.fields.values().find(|def| {
                def.aliases
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(name))
            })
        })
    }

    /// Resolve a name or fail with `UnknownField`
    pub fn resolve(&self, name: &str) -> Result<&FieldDef<T>, QueryError> {
        self.get(name).ok_or_else(|| QueryError::UnknownField {
            field: name.to_string(),
        })
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDef<T>> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> fmt::Debug for FieldMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMap")
            .field("key", &self.key)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
