//! Typed contracts for model extraction output.

use serde::{Deserialize, Serialize};

/// Confidence a value must strictly exceed to be accepted.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// One per-field extraction result reported by the model.
///
/// Every member is tolerant of omission: a row the model left half
/// empty still deserializes and is simply never accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedValue {
    /// Field name the value belongs to.
    #[serde(default)]
    pub name: String,
    /// Extracted value, `null` when missing or refused.
    #[serde(default)]
    pub value: serde_json::Value,
    /// Model certainty from 0.0 to 1.0.
    #[serde(default)]
    pub confidence: f64,
    /// Short model explanation for the value or its absence.
    #[serde(default)]
    pub reasoning: String,
}

impl ExtractedValue {
    /// Builds a row for a value the caller supplied directly, bypassing
    /// model inference.
    pub fn certain(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    /// A value is accepted only when it is present and the model is
    /// strictly more than [`CONFIDENCE_THRESHOLD`] certain of it.
    ///
    /// A `null` value with confidence 1.0 is how the model reports an
    /// explicit refusal; it is never accepted.
    pub fn is_acceptable(&self) -> bool {
        self.is_acceptable_at(CONFIDENCE_THRESHOLD)
    }

    /// [`is_acceptable`](Self::is_acceptable) with a caller-chosen bar.
    /// The comparison stays strict, so a row at exactly the threshold is
    /// still rejected.
    pub fn is_acceptable_at(&self, threshold: f64) -> bool {
        !self.value.is_null() && self.confidence > threshold
    }
}

/// Parses the extraction payload the model returned.
///
/// The contract asks for an array of rows, but models answering about a
/// single field often return the bare row object instead; that shape is
/// wrapped rather than rejected.
pub fn parse_extraction(
    value: serde_json::Value,
) -> Result<Vec<ExtractedValue>, serde_json::Error> {
    match value {
        serde_json::Value::Object(_) => {
            serde_json::from_value::<ExtractedValue>(value).map(|row| vec![row])
        }
        other => serde_json::from_value(other),
    }
}

/// A generated question turn together with the field ids it asks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SmartQuestion {
    /// Conversational message to show the user.
    pub message: String,
    /// Ids of the fields the question covers, echoed from the schema.
    #[serde(default)]
    pub requested_fields: Vec<String>,
}
