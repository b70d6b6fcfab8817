//! Wire shape of a product and batch decoding
//!
//! Records arrive as JSON arrays. Each element is normalized (grid property
//! names mapped to the camelCase keys), filtered and validated for the
//! operation at hand, and only then deserialized.

use crate::core::error::{FieldValidationError, GridError, GridResult, ValidationError};
use crate::core::validation::{RecordRules, filters, validators};
use crate::products::model::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Maximum length of a product name, in characters
pub const NAME_MAX_LEN: usize = 40;

/// Grid property names accepted in place of the camelCase keys
const KEY_ALIASES: &[(&str, &str)] = &[
    ("ProductID", "id"),
    ("ProductName", "name"),
    ("UnitPrice", "unitPrice"),
    ("UnitsInStock", "unitsInStock"),
    ("Discontinued", "discontinued"),
];

/// Product as exchanged with the grid
///
/// ```json
/// {"id": 1, "name": "Chai", "unitPrice": 18.0, "unitsInStock": 39, "discontinued": false}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default, alias = "ProductID")]
    pub id: Option<i32>,

    #[serde(default, alias = "ProductName")]
    pub name: String,

    #[serde(default, alias = "UnitPrice")]
    pub unit_price: Option<Decimal>,

    #[serde(default, alias = "UnitsInStock")]
    pub units_in_stock: Option<i16>,

    #[serde(default, alias = "Discontinued")]
    pub discontinued: bool,
}

/// The write operation a batch is decoded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOp {
    Create,
    Update,
    Destroy,
}

impl RecordOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOp::Create => "create",
            RecordOp::Update => "update",
            RecordOp::Destroy => "destroy",
        }
    }

    /// Validation rules for this operation
    pub fn rules(&self) -> RecordRules {
        let mut rules = RecordRules::new("product");

        if matches!(self, RecordOp::Update | RecordOp::Destroy) {
            rules.add_validator("id", validators::required());
        }

        if matches!(self, RecordOp::Create | RecordOp::Update) {
            rules.add_filter("name", filters::trim());
            rules.add_validator("name", validators::required());
            rules.add_validator("name", validators::string_length(1, NAME_MAX_LEN));
            rules.add_validator("unitPrice", validators::non_negative());
            rules.add_validator("unitsInStock", validators::non_negative());
        }

        rules
    }
}

impl fmt::Display for RecordOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProductRecord {
    /// Decode a batch for `op`, reporting every invalid field of every record.
    ///
    /// Field paths in errors are prefixed with the record position, e.g.
    /// `[2].name`.
    pub fn decode_batch(op: RecordOp, payload: Vec<Value>) -> GridResult<Vec<ProductRecord>> {
        let rules = op.rules();
        let mut errors = Vec::new();
        let mut cleaned = Vec::with_capacity(payload.len());

        for (index, value) in payload.into_iter().enumerate() {
            match rules.validate_and_filter(normalize_keys(value)) {
                Ok(value) => cleaned.push(value),
                Err(field_errors) => errors.extend(field_errors.into_iter().map(|e| {
                    FieldValidationError {
                        field: format!("[{}].{}", index, e.field),
                        message: e.message,
                    }
                })),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::FieldErrors(errors).into());
        }

        cleaned
            .into_iter()
            .map(|value| serde_json::from_value::<ProductRecord>(value).map_err(GridError::from))
            .collect()
    }

    /// Identifier of a validated update/destroy record
    pub fn require_id(&self) -> GridResult<i32> {
        self.id.ok_or_else(|| {
            ValidationError::FieldError {
                field: "id".to_string(),
                message: "'id' is required".to_string(),
            }
            .into()
        })
    }

    /// Entity for this record; the id is left for the store to assign when absent
    pub fn into_product(self) -> Product {
        Product {
            product_id: self.id.unwrap_or_default(),
            product_name: self.name,
            unit_price: self.unit_price,
            units_in_stock: self.units_in_stock,
            discontinued: self.discontinued,
        }
    }
}

impl From<Product> for ProductRecord {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.product_id),
            name: product.product_name,
            unit_price: product.unit_price,
            units_in_stock: product.units_in_stock,
            discontinued: product.discontinued,
        }
    }
}

/// Name-only projection served to auto-complete widgets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductName {
    #[serde(rename = "ProductName")]
    pub product_name: String,
}

impl From<Product> for ProductName {
    fn from(product: Product) -> Self {
        Self {
            product_name: product.product_name,
        }
    }
}

// Rename grid property names so rules keyed by camelCase names see them
fn normalize_keys(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        for (alias, key) in KEY_ALIASES {
            if object.contains_key(*key) {
                continue;
            }
            if let Some(v) = object.remove(*alias) {
                object.insert((*key).to_string(), v);
            }
        }
    }
    value
}
