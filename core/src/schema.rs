use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One indexed field: its name on source documents, its relative importance,
/// and whether its content is HTML markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub weight: f32,
    pub is_html: bool,
}

/// The set of fields that participate in indexing. Immutable once built;
/// field names are unique and weights strictly positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: Vec<FieldConfig>,
}

impl FieldSchema {
    pub fn builder() -> FieldSchemaBuilder {
        FieldSchemaBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct FieldSchemaBuilder {
    fields: Vec<FieldConfig>,
}

impl FieldSchemaBuilder {
    /// Declare an indexed field. Fields are analyzed in declaration order.
    pub fn field<S: Into<String>>(mut self, name: S, weight: f32, is_html: bool) -> Self {
        self.fields.push(FieldConfig {
            name: name.into(),
            weight,
            is_html,
        });
        self
    }

    pub fn build(self) -> Result<FieldSchema> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(Error::schema("field name must not be empty"));
            }
            if !(field.weight > 0.0 && field.weight.is_finite()) {
                return Err(Error::schema(format!(
                    "field '{}' must have a positive finite weight, got {}",
                    field.name, field.weight
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::schema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(FieldSchema {
            fields: self.fields,
        })
    }
}
