//! Per-session collection state and retry policy.
//!
//! The orchestrator keeps all of its mutable session context here so the
//! transition decisions themselves stay pure: which fields are on the
//! wire, what has been accepted so far, and what to do about an invalid
//! field are all answerable without touching a registry or a model.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::extraction::ExtractedValue;
use crate::domain::form::Field;
use crate::domain::foundation::FieldId;

/// Resting state of a collection session between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPhase {
    /// No conversation in flight: before the first question or after reset.
    #[default]
    Idle,
    /// A question or retry prompt is out; the next user turn answers it.
    AwaitingReply,
    /// Every field is settled and the summary turn has been emitted.
    Complete,
}

impl CollectionPhase {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Outcome of merging one extraction result into collected data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Names whose values passed the confidence rule and were written.
    pub accepted: Vec<String>,
    /// Names the model reported but whose values were not accepted.
    pub skipped: Vec<String>,
}

impl MergeReport {
    pub fn accepted_any(&self) -> bool {
        !self.accepted.is_empty()
    }
}

/// Follow-up for the first invalid field found after an import.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryAction {
    /// Re-prompt with the field's structured widget.
    Widget(Field),
    /// Describe the problem in a plain text turn.
    Text(Field),
}

impl RetryAction {
    /// Chooses a follow-up for the first of the registry's invalid fields.
    pub fn for_invalid(invalid: &[Field]) -> Option<Self> {
        let field = invalid.first()?;
        if field.is_complex() {
            Some(Self::Widget(field.clone()))
        } else {
            Some(Self::Text(field.clone()))
        }
    }

    /// The field the follow-up is about.
    pub fn field(&self) -> &Field {
        match self {
            Self::Widget(field) | Self::Text(field) => field,
        }
    }
}

/// Mutable context of one collection session.
///
/// Collected data is append-only within a session: re-answered fields
/// overwrite their entry, but nothing is ever removed short of
/// [`CollectionState::reset`].
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    phase: CollectionPhase,
    current_requested_fields: Option<Vec<FieldId>>,
    collected: BTreeMap<String, Value>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CollectionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    /// The batch of field ids the session is waiting on, if any.
    pub fn current_requested_fields(&self) -> Option<&[FieldId]> {
        self.current_requested_fields.as_deref()
    }

    /// Records that a question for `fields` is now on the wire.
    pub fn request_fields(&mut self, fields: Vec<FieldId>) {
        self.current_requested_fields = Some(fields);
        self.phase = CollectionPhase::AwaitingReply;
    }

    /// Marks the session complete; no batch remains outstanding.
    pub fn complete(&mut self) {
        self.current_requested_fields = None;
        self.phase = CollectionPhase::Complete;
    }

    /// Clears all session context back to a fresh state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collected data
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies the confidence rule to each row and writes the survivors.
    pub fn merge_extracted(&mut self, rows: &[ExtractedValue]) -> MergeReport {
        self.merge_extracted_at(rows, crate::domain::extraction::CONFIDENCE_THRESHOLD)
    }

    /// [`merge_extracted`](Self::merge_extracted) with a caller-chosen
    /// confidence bar.
    pub fn merge_extracted_at(&mut self, rows: &[ExtractedValue], threshold: f64) -> MergeReport {
        let mut report = MergeReport::default();
        for row in rows {
            if row.is_acceptable_at(threshold) {
                self.collected.insert(row.name.clone(), row.value.clone());
                report.accepted.push(row.name.clone());
            } else {
                report.skipped.push(row.name.clone());
            }
        }
        report
    }

    pub fn collected(&self) -> &BTreeMap<String, Value> {
        &self.collected
    }

    /// Owned snapshot of the collected mapping.
    pub fn collected_snapshot(&self) -> BTreeMap<String, Value> {
        self.collected.clone()
    }

    pub fn collected_names(&self) -> impl Iterator<Item = &str> {
        self.collected.keys().map(String::as_str)
    }
}
