//! Filter trees sent by the grid and their predicate text
//!
//! The grid posts a recursive filter object:
//!
//! ```json
//! { "logic": "and", "filters": [
//!     { "field": "UnitsInStock", "operator": "lt", "value": 5 },
//!     { "field": "ProductName", "operator": "contains", "value": "tea" }
//! ] }
//! ```
//!
//! [`FilterNode::flatten`] lists the leaves depth-first and
//! [`FilterNode::to_expression`] renders the tree as
//! `(UnitsInStock < @0 and ProductName.Contains(@1))`, where `@n` is the
//! position of the leaf in the flattened list. The values themselves are
//! bound separately.

use crate::core::error::QueryError;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Logical connective of a composite filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FilterLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterLogic::And => "and",
            FilterLogic::Or => "or",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "and" => Some(FilterLogic::And),
            "or" => Some(FilterLogic::Or),
            _ => None,
        }
    }
}

impl fmt::Display for FilterLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators understood by the query engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    StartsWith,
    EndsWith,
    Contains,
}

impl FilterOperator {
    /// Map a client operator tag (`eq`, `contains`, ...) to an operator
    pub fn from_tag(tag: &str) -> Result<Self, QueryError> {
        let op = match tag.to_ascii_lowercase().as_str() {
            "eq" => FilterOperator::Eq,
            "neq" => FilterOperator::Neq,
            "lt" => FilterOperator::Lt,
            "lte" => FilterOperator::Lte,
            "gt" => FilterOperator::Gt,
            "gte" => FilterOperator::Gte,
            "startswith" => FilterOperator::StartsWith,
            "endswith" => FilterOperator::EndsWith,
            "contains" => FilterOperator::Contains,
            _ => {
                return Err(QueryError::InvalidOperator {
                    operator: tag.to_string(),
                });
            }
        };
        Ok(op)
    }

    /// Rendered form: an infix comparator or a method name
    pub fn rendered(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Neq => "!=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::StartsWith => "StartsWith",
            FilterOperator::EndsWith => "EndsWith",
            FilterOperator::Contains => "Contains",
        }
    }

    /// Whether the operator renders as `field.Method(@n)`
    pub fn is_text_search(&self) -> bool {
        matches!(
            self,
            FilterOperator::StartsWith | FilterOperator::EndsWith | FilterOperator::Contains
        )
    }
}

/// A node of the filter tree: a single comparison or a group of filters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FilterDescriptor")]
pub enum FilterNode {
    Leaf {
        field: String,
        operator: String,
        value: Value,
    },
    Composite {
        logic: FilterLogic,
        filters: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Build a leaf node
    pub fn leaf(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        FilterNode::Leaf {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }

    /// Build a composite node
    pub fn composite(logic: FilterLogic, filters: Vec<FilterNode>) -> Self {
        FilterNode::Composite { logic, filters }
    }

    /// All leaves reachable from this node, depth-first, children in order.
    ///
    /// Composite nodes are never part of the list; an empty composite
    /// contributes nothing.
    pub fn flatten(&self) -> Vec<&FilterNode> {
        let mut leaves = Vec::new();
        self.collect(&mut leaves);
        leaves
    }

    fn collect<'a>(&'a self, leaves: &mut Vec<&'a FilterNode>) {
        match self {
            FilterNode::Leaf { .. } => leaves.push(self),
            FilterNode::Composite { filters, .. } => {
                for filter in filters {
                    filter.collect(leaves);
                }
            }
        }
    }

    /// Render the predicate text, using positions in `flattened` as
    /// parameter references.
    ///
    /// `flattened` must come from [`flatten`](Self::flatten) on the same tree:
    /// leaves are located by identity, not by value, so two equal leaves
    /// still get distinct parameters.
    pub fn to_expression(&self, flattened: &[&FilterNode]) -> Result<String, QueryError> {
        match self {
            FilterNode::Composite { filters, .. } if filters.is_empty() => Ok("true".to_string()),
            FilterNode::Composite { logic, filters } => {
                let parts = filters
                    .iter()
                    .map(|filter| filter.to_expression(flattened))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(&format!(" {} ", logic))))
            }
            FilterNode::Leaf {
                field, operator, ..
            } => {
                let op = FilterOperator::from_tag(operator)?;
                let index = flattened
                    .iter()
                    .position(|leaf| std::ptr::eq(*leaf, self))
                    .ok_or_else(|| QueryError::UnboundLeaf {
                        field: field.clone(),
                    })?;

                if op.is_text_search() {
                    Ok(format!("{}.{}(@{})", field, op.rendered(), index))
                } else {
                    Ok(format!("{} {} @{}", field, op.rendered(), index))
                }
            }
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FilterNode::Leaf { .. })
    }
}

/// Wire shape of a filter, before it is split into leaf/composite
#[derive(Debug, Deserialize)]
struct FilterDescriptor {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    logic: Option<String>,
    #[serde(default)]
    filters: Option<Vec<FilterNode>>,
}

impl TryFrom<FilterDescriptor> for FilterNode {
    type Error = String;

    fn try_from(raw: FilterDescriptor) -> Result<Self, Self::Error> {
        if let Some(filters) = raw.filters {
            let logic = match raw.logic.as_deref() {
                None => FilterLogic::default(),
                Some(word) => FilterLogic::parse(word)
                    .ok_or_else(|| format!("unknown filter logic '{}'", word))?,
            };
            return Ok(FilterNode::Composite { logic, filters });
        }

        let field = raw
            .field
            .filter(|f| !f.is_empty())
            .ok_or_else(|| "filter without 'filters' must have a 'field'".to_string())?;
        let operator = raw
            .operator
            .filter(|o| !o.is_empty())
            .ok_or_else(|| format!("filter on '{}' must have an 'operator'", field))?;

        Ok(FilterNode::Leaf {
            field,
            operator,
            value: raw.value,
        })
    }
}
