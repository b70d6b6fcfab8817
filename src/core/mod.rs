//! Core module containing the data-source types and store traits

pub mod entity;
pub mod error;
pub mod expression;
pub mod field;
pub mod filter;
pub mod query;
pub mod sort;
pub mod store;
pub mod validation;

pub use entity::Entity;
pub use error::{GridError, GridResult};
pub use field::{FieldDef, FieldKind, FieldMap, FieldValue};
pub use filter::{FilterLogic, FilterNode, FilterOperator};
pub use query::{
    DataSourceRequest, DataSourceResult, Predicate, Query, ordering_expression,
    to_data_source_result,
};
pub use sort::SortDescriptor;
pub use store::{DataSession, DataStore, Queryable};
