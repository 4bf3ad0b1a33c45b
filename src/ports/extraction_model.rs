//! Extraction Model Port - Interface for field-aware model behavior.
//!
//! Sits above [`super::ChatModel`]: implementations own prompting and
//! output recovery, so the orchestrator deals only in schemas, phrased
//! questions, and typed extraction rows.

use async_trait::async_trait;

use crate::domain::extraction::{ExtractedValue, SmartQuestion};
use crate::domain::form::ExtractionSchema;

use super::chat_model::{ImageAttachment, ModelError};

/// Port for question phrasing and answer extraction.
#[async_trait]
pub trait ExtractionModel: Send + Sync {
    /// Checks the model session and returns a user-facing availability
    /// notice for the transcript.
    ///
    /// # Errors
    /// Returns `ModelError::Unavailable` if no session can be used.
    async fn ensure_ready(&self) -> Result<String, ModelError>;

    /// Phrases one conversational question covering every field in the
    /// schema, together with the field ids the question addresses.
    async fn smart_question(&self, schema: &ExtractionSchema) -> Result<SmartQuestion, ModelError>;

    /// Extracts one value row per schema field from a user reply.
    ///
    /// # Arguments
    /// * `schema` - The fields the reply may answer
    /// * `text` - The raw user text
    /// * `image` - Optional image the reply arrived with
    async fn extract_data(
        &self,
        schema: &ExtractionSchema,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Vec<ExtractedValue>, ModelError>;
}
