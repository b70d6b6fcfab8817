//! Sort descriptors sent by the grid

use serde::{Deserialize, Serialize};

/// One sort entry: `{"field": "UnitPrice", "dir": "desc"}`
///
/// Nothing is validated here. Each entry's field and direction are checked
/// before its ordering text is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    /// Name of the sorted field
    pub field: String,

    /// Sort direction, `"asc"` or `"desc"`
    pub dir: String,
}

impl SortDescriptor {
    pub fn new(field: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: dir.into(),
        }
    }

    /// Ordering text, e.g. `"UnitPrice desc"`
    pub fn to_expression(&self) -> String {
        format!("{} {}", self.field, self.dir)
    }
}
