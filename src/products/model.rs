//! Product entity and its field allow-list

use crate::core::entity::Entity;
use crate::core::field::{FieldDef, FieldKind, FieldMap, FieldValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A catalogue product as persisted by the stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i32,
    pub product_name: String,
    pub unit_price: Option<Decimal>,
    pub units_in_stock: Option<i16>,
    pub discontinued: bool,
}

impl Product {
    /// Create a product that has not been stored yet
    pub fn new(
        product_name: impl Into<String>,
        unit_price: Option<Decimal>,
        units_in_stock: Option<i16>,
        discontinued: bool,
    ) -> Self {
        Self {
            product_id: 0,
            product_name: product_name.into(),
            unit_price,
            units_in_stock,
            discontinued,
        }
    }
}

static PRODUCT_FIELDS: OnceLock<FieldMap<Product>> = OnceLock::new();

fn product_fields() -> FieldMap<Product> {
    FieldMap::new("ProductID")
        .field(FieldDef {
            name: "ProductID",
            column: "product_id",
            kind: FieldKind::Integer,
            aliases: &["id", "product_id"],
            get: |p: &Product| FieldValue::Integer(i64::from(p.product_id)),
        })
        .field(FieldDef {
            name: "ProductName",
            column: "product_name",
            kind: FieldKind::Text,
            aliases: &["name", "product_name"],
            get: |p: &Product| FieldValue::String(p.product_name.clone()),
        })
        .field(FieldDef {
            name: "UnitPrice",
            column: "unit_price",
            kind: FieldKind::Decimal,
            aliases: &["unit_price"],
            get: |p: &Product| FieldValue::from(p.unit_price),
        })
        .field(FieldDef {
            name: "UnitsInStock",
            column: "units_in_stock",
            kind: FieldKind::Integer,
            aliases: &["units_in_stock"],
            get: |p: &Product| FieldValue::from(p.units_in_stock),
        })
        .field(FieldDef {
            name: "Discontinued",
            column: "discontinued",
            kind: FieldKind::Boolean,
            aliases: &[],
            get: |p: &Product| FieldValue::Boolean(p.discontinued),
        })
}

impl Entity for Product {
    fn entity_type() -> &'static str {
        "product"
    }

    fn fields() -> &'static FieldMap<Self> {
        PRODUCT_FIELDS.get_or_init(product_fields)
    }

    fn id(&self) -> i32 {
        self.product_id
    }

    fn set_id(&mut self, id: i32) {
        self.product_id = id;
    }
}
