//! Narrow typed view of a form field.
//!
//! The orchestrator never sees registry-internal field objects; it works
//! against this snapshot shape regardless of which registry produced it.
//! Values mutate only through registry imports, so a `Field` is a moment-in-
//! time view, and fillability is recomputed on every query rather than
//! cached.
//!
//! # Invariants
//!
//! A field is *fillable* iff its type is collectable AND (it has no value or
//! is invalid) AND it is visible, enabled, and not read-only.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::FieldId;

use super::field_type::FieldType;

/// Snapshot of a single form field as seen by the collection flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Stable identifier, immutable for the form's lifetime.
    pub id: FieldId,
    /// Human/schema key; extraction results are keyed by this.
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Allowed values for choice types; empty for open inputs.
    #[serde(rename = "enum", default)]
    pub enum_options: Vec<Value>,
    #[serde(default)]
    pub required: bool,
    /// Current value; set only through registry import.
    #[serde(default)]
    pub value: Option<Value>,
    /// Engine-computed validity verdict.
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub validation_message: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub read_only: bool,
}

fn default_true() -> bool {
    true
}

impl Field {
    /// Creates a field snapshot with everything but identity defaulted.
    pub fn new(id: FieldId, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            name: name.into(),
            field_type,
            label: None,
            description: None,
            placeholder: None,
            enum_options: Vec::new(),
            required: false,
            value: None,
            valid: true,
            validation_message: None,
            visible: true,
            enabled: true,
            read_only: false,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the description shown to the extraction model.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the placeholder hint.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the allowed values.
    pub fn with_enum_options(mut self, options: Vec<Value>) -> Self {
        self.enum_options = options;
        self
    }

    /// Marks the field required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the current value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the validity verdict and message.
    pub fn with_validity(mut self, valid: bool, message: Option<String>) -> Self {
        self.valid = valid;
        self.validation_message = message;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// True if the field holds a meaningful value.
    ///
    /// Absent, JSON null, the empty string, and the empty array all count
    /// as "no value" so an unanswered field is never mistaken for an
    /// answered one.
    pub fn has_value(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// True if this field should still be collected.
    pub fn is_fillable(&self) -> bool {
        self.field_type.is_collectable()
            && (!self.has_value() || !self.valid)
            && self.visible
            && self.enabled
            && !self.read_only
    }

    /// True if this field needs a structured widget rather than free text.
    pub fn is_complex(&self) -> bool {
        self.field_type.is_complex()
    }

    /// Display label, falling back to the schema name.
    pub fn label_text(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// True if the field holds a value the engine rejected.
    pub fn is_invalid(&self) -> bool {
        self.has_value() && !self.valid
    }
}
