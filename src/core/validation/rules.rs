//! Per-operation validation rules for one record type

use crate::core::error::FieldValidationError;
use indexmap::IndexMap;
use serde_json::Value;

type Validator = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;
type Filter = Box<dyn Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Filters and validators keyed by JSON field name
///
/// Filters run first and rewrite the field in place; validators then see the
/// filtered value. A field missing from the object is validated as `null`.
///
/// # Example
///
/// ```rust,ignore
/// let mut rules = RecordRules::new("product");
/// rules.add_filter("name", filters::trim());
/// rules.add_validator("name", validators::required());
/// let cleaned = rules.validate_and_filter(json!({"name": "  Chai "}))?;
/// ```
pub struct RecordRules {
    entity_type: &'static str,
    filters: IndexMap<String, Vec<Filter>>,
    validators: IndexMap<String, Vec<Validator>>,
}

impl RecordRules {
    pub fn new(entity_type: &'static str) -> Self {
        Self {
            entity_type,
            filters: IndexMap::new(),
            validators: IndexMap::new(),
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn add_filter<F>(&mut self, field: &str, filter: F)
    where
        F: Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.filters
            .entry(field.to_string())
            .or_default()
            .push(Box::new(filter));
    }

    pub fn add_validator<V>(&mut self, field: &str, validator: V)
    where
        V: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .entry(field.to_string())
            .or_default()
            .push(Box::new(validator));
    }

    /// Apply filters then validators, collecting every failure.
    pub fn validate_and_filter(
        &self,
        mut payload: Value,
    ) -> Result<Value, Vec<FieldValidationError>> {
        let mut errors = Vec::new();

        let Some(object) = payload.as_object_mut() else {
            return Err(vec![FieldValidationError {
                field: self.entity_type.to_string(),
                message: "expected a JSON object".to_string(),
            }]);
        };

        for (field, filters) in &self.filters {
            let Some(mut value) = object.remove(field) else {
                continue;
            };
            for filter in filters {
                value = match filter(field, value.clone()) {
                    Ok(filtered) => filtered,
                    Err(e) => {
                        errors.push(FieldValidationError {
                            field: field.clone(),
                            message: e.to_string(),
                        });
                        value
                    }
                };
            }
            object.insert(field.clone(), value);
        }

        for (field, validators) in &self.validators {
            let value = object.get(field).unwrap_or(&Value::Null);
            for validator in validators {
                if let Err(message) = validator(field, value) {
                    errors.push(FieldValidationError {
                        field: field.clone(),
                        message,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }
}

impl std::fmt::Debug for RecordRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordRules")
            .field("entity_type", &self.entity_type)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
