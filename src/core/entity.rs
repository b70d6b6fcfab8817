//! Entity trait implemented by every persisted type

use crate::core::field::FieldMap;

/// Base trait for entities served through a data source.
///
/// All entities have:
/// - an integer identifier assigned by the store on insert
/// - an entity type name used in errors and logs (e.g. "product")
/// - an allow-list of the fields clients may filter and sort on
pub trait Entity: Clone + Send + Sync + 'static {
    /// The singular entity type name (e.g., "product")
    fn entity_type() -> &'static str;

    /// Allow-list of filterable and sortable fields.
    ///
    /// Its key field defines the default order of every query.
    fn fields() -> &'static FieldMap<Self>;

    /// Get the store-assigned identifier (0 before insertion)
    fn id(&self) -> i32;

    /// Set the identifier; called by stores on insert
    fn set_id(&mut self, id: i32);
}
