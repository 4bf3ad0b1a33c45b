//! Form definition model.
//!
//! A definition is the serde-shaped description of a form: ordered field
//! definitions, possibly nested in panels, plus form-level properties such
//! as the thank-you message. Registries load one of these and flatten it
//! into the leaf fields the conversation collects.
//!
//! Panels honor a declared child ordering (`itemsOrder`); children not
//! listed there follow in declaration order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::domain::foundation::FieldId;

use super::field::Field;
use super::field_type::FieldType;

/// Default completion message when the definition does not provide one.
pub const DEFAULT_THANK_YOU_MESSAGE: &str = "Thank you for your submission!";

/// Errors raised while loading a form definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read definition file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse definition: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A complete form definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<FieldDefinition>,
    #[serde(default)]
    pub thank_you_message: Option<String>,
}

/// One field (or panel) in a form definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Raw input type; both canonical names and generic HTML aliases work.
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(rename = "enum", default)]
    pub enum_options: Vec<Value>,
    #[serde(default)]
    pub required: bool,
    /// Lower bound for range fields.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for range fields.
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Pre-filled value, if any.
    #[serde(default)]
    pub value: Option<Value>,
    /// Panel children.
    #[serde(default)]
    pub items: Vec<FieldDefinition>,
    /// Declared ordering of panel children, by name.
    #[serde(default)]
    pub items_order: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl FormDefinition {
    /// Parses a definition from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts a JSON value into a definition.
    pub fn from_value(value: Value) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Reads and parses a definition from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The completion message, falling back to the stock one.
    pub fn thank_you_or_default(&self) -> &str {
        self.thank_you_message
            .as_deref()
            .unwrap_or(DEFAULT_THANK_YOU_MESSAGE)
    }

    /// Flattens the definition into leaf fields, recursing panels.
    ///
    /// Within each panel, children named by `itemsOrder` come first in that
    /// order; the rest keep declaration order. Definitions that cannot
    /// produce a usable identity (no id and no name) are skipped.
    pub fn flatten(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        collect_fields(&self.items, &[], &mut fields);
        fields
    }
}

fn collect_fields(items: &[FieldDefinition], order: &[String], out: &mut Vec<Field>) {
    let mut taken = vec![false; items.len()];

    for name in order {
        if let Some(pos) = items
            .iter()
            .position(|item| !name.is_empty() && item.name == *name)
        {
            if !taken[pos] {
                taken[pos] = true;
                collect_one(&items[pos], out);
            }
        }
    }

    for (pos, item) in items.iter().enumerate() {
        if !taken[pos] {
            collect_one(item, out);
        }
    }
}

fn collect_one(def: &FieldDefinition, out: &mut Vec<Field>) {
    let field_type = def
        .input_type
        .as_deref()
        .map(FieldType::from_input_type)
        .unwrap_or(FieldType::TextInput);

    if field_type.is_container() {
        collect_fields(&def.items, &def.items_order, out);
        return;
    }

    if let Some(field) = def.to_field(field_type) {
        out.push(field);
    }
}

impl FieldDefinition {
    /// Builds the runtime field view for a leaf definition.
    fn to_field(&self, field_type: FieldType) -> Option<Field> {
        let raw_id = match (&self.id, self.name.is_empty()) {
            (Some(id), _) => id.clone(),
            (None, false) => format!("{}-{}", field_type.as_str(), self.name),
            (None, true) => return None,
        };
        let id = FieldId::new(raw_id).ok()?;

        let name = if self.name.is_empty() {
            id.as_str().to_string()
        } else {
            self.name.clone()
        };

        let mut field = Field::new(id, name, field_type)
            .with_enum_options(self.enum_options.clone())
            .with_required(self.required);
        field.label = self.label.clone();
        field.description = self.description.clone();
        field.placeholder = self.placeholder.clone();
        field.visible = self.visible;
        field.enabled = self.enabled;
        field.read_only = self.read_only;
        field.value = self.value.clone();
        Some(field)
    }
}
