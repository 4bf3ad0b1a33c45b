//! Field Registry Port - Interface to the form-validation engine.
//!
//! The registry owns the canonical field state: values, visibility, and
//! per-field validity verdicts. The orchestrator only ever sees the
//! narrow [`Field`] view and never mutates fields except through
//! [`FieldRegistry::import_data`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::form::{Field, FormDefinition};
use crate::domain::foundation::FieldId;

/// Port for the form-validation engine.
///
/// Every read reflects all imports that settled before it; validity is
/// re-computed on import, never cached stale.
#[async_trait]
pub trait FieldRegistry: Send + Sync {
    /// Loads a form definition, replacing any previous one. Returning
    /// `Ok` signals the registry is ready for queries.
    async fn load(&self, definition: FormDefinition) -> Result<(), RegistryError>;

    /// Ordered snapshot of the fields still eligible for collection.
    async fn fillable_fields(&self) -> Result<Vec<Field>, RegistryError>;

    /// Looks up a single field by id.
    async fn field(&self, id: &FieldId) -> Result<Option<Field>, RegistryError>;

    /// Snapshot of fields holding a value the engine rejected.
    async fn invalid_fields(&self) -> Result<Vec<Field>, RegistryError>;

    /// Imports a batch of values keyed by field name and re-validates.
    /// Names that match no field are ignored.
    async fn import_data(&self, data: &BTreeMap<String, Value>) -> Result<(), RegistryError>;

    /// The form's completion message.
    async fn thank_you_message(&self) -> Result<String, RegistryError>;

    /// Field counts for reporting.
    async fn stats(&self) -> Result<RegistryStats, RegistryError>;
}

/// Field counts over the loaded form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub required: usize,
    pub optional: usize,
    /// Count per wire-name field type.
    pub by_type: BTreeMap<String, usize>,
}

/// Field registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A query or import arrived before any form was loaded.
    #[error("no form loaded")]
    NotLoaded,

    /// The registry backend failed to apply an operation.
    #[error("registry operation failed: {reason}")]
    Backend { reason: String },
}

impl RegistryError {
    /// Creates a backend error.
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}
