//! LLM-backed extraction model.
//!
//! Composes any [`ChatModel`] into the [`ExtractionModel`] port: builds
//! the prompts, requests a completion, and coerces the model's text
//! output back into typed values.

use async_trait::async_trait;

use crate::domain::extraction::{coerce_json, parse_extraction, ExtractedValue, SmartQuestion};
use crate::domain::form::ExtractionSchema;
use crate::ports::{ChatModel, ChatRequest, ExtractionModel, ImageAttachment, ModelError};

use super::prompts;

/// Extraction model driving a chat completion backend.
#[derive(Debug, Clone)]
pub struct LlmExtractionModel<M> {
    model: M,
}

impl<M: ChatModel> LlmExtractionModel<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    fn schema_json(schema: &ExtractionSchema) -> Result<String, ModelError> {
        serde_json::to_string_pretty(schema)
            .map_err(|e| ModelError::parse(format!("schema serialization failed: {}", e)))
    }
}

#[async_trait]
impl<M: ChatModel> ExtractionModel for LlmExtractionModel<M> {
    /// Reports readiness without a remote probe. A backend that turns
    /// out to be unreachable surfaces on the first completion instead,
    /// where the conversation already degrades gracefully.
    async fn ensure_ready(&self) -> Result<String, ModelError> {
        let info = self.model.info();
        Ok(format!("AI model {} is available", info.model))
    }

    async fn smart_question(&self, schema: &ExtractionSchema) -> Result<SmartQuestion, ModelError> {
        let schema_json = Self::schema_json(schema)?;
        let request = ChatRequest::new(prompts::smart_question_prompt(&schema_json))
            .with_system_prompt(prompts::JSON_ONLY_SYSTEM_PROMPT);

        let response = self.model.complete(request).await?;
        tracing::debug!(
            chars = response.content.len(),
            "smart question response received"
        );

        let value = coerce_json(&response.content).map_err(|e| ModelError::parse(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| ModelError::parse(format!("smart question shape: {}", e)))
    }

    async fn extract_data(
        &self,
        schema: &ExtractionSchema,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Vec<ExtractedValue>, ModelError> {
        let schema_json = Self::schema_json(schema)?;
        let mut request = ChatRequest::new(prompts::extraction_prompt(&schema_json, text))
            .with_system_prompt(prompts::JSON_ONLY_SYSTEM_PROMPT);
        if let Some(image) = image {
            request = request.with_image(image.clone());
        }

        let response = self.model.complete(request).await?;
        tracing::debug!(
            chars = response.content.len(),
            "extraction response received"
        );

        let value = coerce_json(&response.content).map_err(|e| ModelError::parse(e.to_string()))?;
        parse_extraction(value).map_err(|e| ModelError::parse(format!("extraction shape: {}", e)))
    }
}
