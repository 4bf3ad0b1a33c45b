//! Schema projection sent to the extraction model.
//!
//! A schema is a throwaway, per-request description of the fields one
//! extraction or question call is about. It deliberately exposes only what
//! the model needs (`{id, type, enum, description, placeholder}` keyed by
//! field name) and nothing registry-internal. Projecting the same field set
//! twice yields a structurally identical schema.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::foundation::FieldId;

use super::field::Field;
use super::field_type::FieldType;

/// Per-field entry in an extraction schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "enum")]
    pub enum_options: Vec<Value>,
    pub description: String,
    pub placeholder: String,
}

/// JSON-schema-shaped projection of a field set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSchema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    properties: BTreeMap<String, FieldDescriptor>,
}

impl ExtractionSchema {
    /// Projects a field set into a schema, keyed by field name.
    pub fn for_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Self {
        let properties = fields
            .into_iter()
            .map(|field| {
                let descriptor = FieldDescriptor {
                    id: field.id.clone(),
                    field_type: field.field_type,
                    enum_options: field.enum_options.clone(),
                    description: field.description.clone().unwrap_or_default(),
                    placeholder: field.placeholder.clone().unwrap_or_default(),
                };
                (field.name.clone(), descriptor)
            })
            .collect();

        Self {
            schema_type: "object",
            properties,
        }
    }

    /// Field names covered by this schema.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Looks up a descriptor by field name.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.properties.get(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
