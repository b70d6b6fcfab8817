//! Evaluates predicate and ordering text against entities in memory
//!
//! Both are compiled once per query: field names are resolved through the
//! entity's [`FieldMap`] and parameters are bound, so an invalid query fails
//! even when the store is empty.

use crate::core::error::QueryError;
use crate::core::expression::{CompareOp, Expr, TextMethod, parse_ordering, parse_predicate};
use crate::core::field::{FieldKind, FieldMap, FieldValue};
use crate::core::query::Predicate;
use std::cmp::Ordering;

type Getter<T> = fn(&T) -> FieldValue;

/// A predicate ready to run against entities of type `T`
pub enum Matcher<T> {
    Literal(bool),
    Compare {
        get: Getter<T>,
        op: CompareOp,
        value: FieldValue,
    },
    Text {
        get: Getter<T>,
        method: TextMethod,
        needle: String,
    },
    All(Vec<Matcher<T>>),
    Any(Vec<Matcher<T>>),
}

impl<T> Matcher<T> {
    /// Compile a predicate; `None` matches everything
    pub fn compile(
        predicate: Option<&Predicate>,
        fields: &FieldMap<T>,
    ) -> Result<Self, QueryError> {
        match predicate {
            Some(predicate) => {
                let expr = parse_predicate(&predicate.expression)?;
                Self::from_expr(&expr, predicate, fields)
            }
            None => Ok(Matcher::Literal(true)),
        }
    }

    fn from_expr(
        expr: &Expr,
        predicate: &Predicate,
        fields: &FieldMap<T>,
    ) -> Result<Self, QueryError> {
        Ok(match expr {
            Expr::Literal(value) => Matcher::Literal(*value),
            Expr::Compare { field, op, param } => {
                let def = fields.resolve(field)?;
                Matcher::Compare {
                    get: def.get,
                    op: *op,
                    value: predicate.parameter(*param)?.clone(),
                }
            }
            Expr::Text {
                field,
                method,
                param,
            } => {
                let def = fields.resolve(field)?;
                if def.kind != FieldKind::Text {
                    return Err(QueryError::UnsupportedOperator {
                        field: field.clone(),
                        operator: method.name().to_string(),
                    });
                }
                let needle = match predicate.parameter(*param)? {
                    FieldValue::String(s) => s.to_lowercase(),
                    other => {
                        return Err(QueryError::TypeMismatch {
                            field: field.clone(),
                            expected: FieldKind::Text.name(),
                            value: other.to_string(),
                        });
                    }
                };
                Matcher::Text {
                    get: def.get,
                    method: *method,
                    needle,
                }
            }
            Expr::And(terms) => Matcher::All(
                terms
                    .iter()
                    .map(|term| Self::from_expr(term, predicate, fields))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Or(terms) => Matcher::Any(
                terms
                    .iter()
                    .map(|term| Self::from_expr(term, predicate, fields))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn matches(&self, entity: &T) -> bool {
        match self {
            Matcher::Literal(value) => *value,
            Matcher::Compare { get, op, value } => compare(&get(entity), *op, value),
            Matcher::Text {
                get,
                method,
                needle,
            } => match get(entity) {
                FieldValue::String(s) => {
                    let haystack = s.to_lowercase();
                    match method {
                        TextMethod::StartsWith => haystack.starts_with(needle.as_str()),
                        TextMethod::EndsWith => haystack.ends_with(needle.as_str()),
                        TextMethod::Contains => haystack.contains(needle.as_str()),
                    }
                }
                _ => false,
            },
            Matcher::All(terms) => terms.iter().all(|term| term.matches(entity)),
            Matcher::Any(terms) => terms.iter().any(|term| term.matches(entity)),
        }
    }
}

// Equality treats null as a value; ordered comparisons with null are false.
fn compare(left: &FieldValue, op: CompareOp, right: &FieldValue) -> bool {
    let equal = match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => left.compare(right) == Some(Ordering::Equal),
    };

    match op {
        CompareOp::Eq => equal,
        CompareOp::Ne => !equal,
        CompareOp::Lt => left.compare(right) == Some(Ordering::Less),
        CompareOp::Le => matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => left.compare(right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            left.compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// A compiled multi-key ordering
pub struct Sorter<T> {
    keys: Vec<(Getter<T>, bool)>,
}

impl<T> Sorter<T> {
    pub fn compile(ordering: &str, fields: &FieldMap<T>) -> Result<Self, QueryError> {
        let keys = parse_ordering(ordering)?
            .into_iter()
            .map(|term| -> Result<(Getter<T>, bool), QueryError> {
                Ok((fields.resolve(&term.field)?.get, term.descending))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { keys })
    }

    /// Stable sort: items equal on every key keep their relative order
    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| {
            self.keys
                .iter()
                .map(|(get, descending)| {
                    let ordering = get(a).sort_cmp(&get(b));
                    if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
}
