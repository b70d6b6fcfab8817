//! Paging, sorting and filtering of a data source
//!
//! The grid's read request (`take`, `skip`, `sort`, `filter`) is turned into a
//! [`Query`] and run against a [`Queryable`] source. The result carries one
//! page of items and the number of items that matched the filter before
//! paging, which the grid needs to draw its pager.

use crate::core::entity::Entity;
use crate::core::error::{GridResult, QueryError};
use crate::core::field::{FieldKind, FieldMap, FieldValue};
use crate::core::filter::{FilterNode, FilterOperator};
use crate::core::sort::SortDescriptor;
use crate::core::store::Queryable;
use serde::{Deserialize, Serialize};

/// Read request posted by the grid
///
/// Extra keys sent by the widget (`page`, `pageSize`, ...) are ignored.
///
/// # Example
/// ```json
/// {"take": 10, "skip": 20,
///  "sort": [{"field": "UnitPrice", "dir": "desc"}],
///  "filter": {"logic": "and", "filters": [{"field": "Discontinued", "operator": "eq", "value": false}]}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataSourceRequest {
    /// Page size; `None` means no limit
    pub take: Option<u64>,

    /// Number of items to skip
    pub skip: u64,

    /// Sort entries, earlier entries take precedence
    pub sort: Option<Vec<SortDescriptor>>,

    /// Root of the filter tree
    pub filter: Option<FilterNode>,
}

impl DataSourceRequest {
    /// Page size after applying the configured maximum
    pub fn take(&self, max_take: Option<u64>) -> Option<u64> {
        match (self.take, max_take) {
            (Some(take), Some(max)) => Some(take.min(max)),
            (None, Some(max)) => Some(max),
            (take, None) => take,
        }
    }

    pub fn sort(&self) -> &[SortDescriptor] {
        self.sort.as_deref().unwrap_or_default()
    }
}

/// One page of results plus the filtered total
///
/// Serializes to the envelope the grid expects: `{"data": [...], "total": n}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceResult<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> DataSourceResult<T> {
    /// Convert every item, keeping the total
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> DataSourceResult<U> {
        DataSourceResult {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Predicate text plus its positional parameters
///
/// `@n` in the expression refers to `parameters[n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub expression: String,
    pub parameters: Vec<FieldValue>,
}

impl Predicate {
    /// Compile a filter tree against an allow-list.
    ///
    /// Every leaf is checked before any text is built: the operator must be
    /// known, the field allowed, text-search operators used on text fields
    /// only, and the value convertible to the field's kind.
    pub fn compile<T>(root: &FilterNode, fields: &FieldMap<T>) -> Result<Self, QueryError> {
        let flattened = root.flatten();
        let mut parameters = Vec::with_capacity(flattened.len());

        for leaf in &flattened {
            if let FilterNode::Leaf {
                field,
                operator,
                value,
            } = leaf
            {
                let op = FilterOperator::from_tag(operator)?;
                let def = fields.resolve(field)?;
                if op.is_text_search() && def.kind != FieldKind::Text {
                    return Err(QueryError::UnsupportedOperator {
                        field: field.clone(),
                        operator: operator.clone(),
                    });
                }
                parameters.push(def.kind.coerce(field, value)?);
            }
        }

        let expression = root.to_expression(&flattened)?;
        Ok(Self {
            expression,
            parameters,
        })
    }

    /// Look up a bound parameter
    pub fn parameter(&self, index: usize) -> Result<&FieldValue, QueryError> {
        self.parameters
            .get(index)
            .ok_or(QueryError::MissingParameter { index })
    }
}

/// Everything a source needs to produce one page
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub predicate: Option<Predicate>,
    /// Ordering text, e.g. `"UnitPrice desc, ProductID asc"`
    pub ordering: String,
    pub skip: u64,
    pub take: Option<u64>,
}

/// Ordering text for a list of sort entries.
///
/// Each entry is checked on its own before anything is joined: the field
/// must be on the allow-list and the direction must be `asc` or `desc`
/// (any case). Without entries the source is ordered by its key. Otherwise
/// the key is appended as the last tie-breaker unless an entry already names
/// it, so that pages never overlap or skip items between requests.
pub fn ordering_expression<T>(
    sort: &[SortDescriptor],
    fields: &FieldMap<T>,
) -> Result<String, QueryError> {
    let key = fields.key();
    let mut terms = Vec::with_capacity(sort.len() + 1);
    let mut orders_by_key = false;

    for entry in sort {
        let def = fields.resolve(&entry.field)?;
        if !matches!(entry.dir.to_ascii_lowercase().as_str(), "asc" | "desc") {
            return Err(QueryError::InvalidSortDirection {
                field: entry.field.clone(),
                direction: entry.dir.clone(),
            });
        }
        orders_by_key |= def.name == key;
        terms.push(entry.to_expression());
    }

    if !orders_by_key {
        terms.push(format!("{} asc", key));
    }

    Ok(terms.join(", "))
}

/// Filter, count, sort and page a source.
///
/// `total` is the number of items matching `filter` before paging.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = store.session().await?;
/// let page = to_data_source_result(session.as_mut(), Some(10), 20, &sort, filter.as_ref()).await?;
/// assert!(page.data.len() <= 10);
/// ```
pub async fn to_data_source_result<T, Q>(
    source: &mut Q,
    take: Option<u64>,
    skip: u64,
    sort: &[SortDescriptor],
    filter: Option<&FilterNode>,
) -> GridResult<DataSourceResult<T>>
where
    T: Entity,
    Q: Queryable<T> + ?Sized,
{
    let fields = T::fields();

    let predicate = filter
        .map(|root| Predicate::compile(root, fields))
        .transpose()?;
    let ordering = ordering_expression(sort, fields)?;

    tracing::debug!(
        entity = T::entity_type(),
        predicate = predicate.as_ref().map(|p| p.expression.as_str()),
        ordering = %ordering,
        skip,
        take,
        "querying data source"
    );

    let total = source.count(predicate.as_ref()).await?;

    let query = Query {
        predicate,
        ordering,
        skip,
        take,
    };
    let data = source.fetch(&query).await?;

    Ok(DataSourceResult { data, total })
}
