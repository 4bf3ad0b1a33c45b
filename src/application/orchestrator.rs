//! Field-collection orchestrator.
//!
//! Drives a form-filling conversation end to end: pick the next batch of
//! fillable fields, ask for them, extract values from the user's reply,
//! import what was accepted, read back validation failures, and repeat
//! until the registry has nothing left to fill. Every transcript append
//! is broadcast to subscribers as it happens.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use crate::domain::collection::{
    select_batch, CollectionPhase, CollectionState, RetryAction, DEFAULT_MAX_BATCH_SIZE,
};
use crate::domain::conversation::{CollectionProgress, ConversationTurn};
use crate::domain::extraction::{ExtractedValue, CONFIDENCE_THRESHOLD};
use crate::domain::form::{ExtractionSchema, Field, FormDefinition};
use crate::domain::foundation::{ConversationId, FieldId};
use crate::ports::{ExtractionModel, FieldRegistry, ImageAttachment, RegistryError};

/// Buffered transcript events per subscriber before lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Reply when extraction yields nothing usable or fails outright.
const NOT_UNDERSTOOD: &str = "I didn't quite understand that. Could you please try again?";

/// User input for one conversation turn.
#[derive(Debug, Clone, Default)]
pub struct UserResponse {
    /// Text content of the reply.
    pub content: String,
    /// Optional image to extract from alongside the text.
    pub image: Option<ImageAttachment>,
    /// Target field when the reply comes from a widget.
    pub field: Option<FieldId>,
}

impl UserResponse {
    /// Creates a plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image: None,
            field: None,
        }
    }

    /// Attaches an image.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// Targets the reply at a single field, bypassing extraction.
    pub fn for_field(mut self, field: FieldId) -> Self {
        self.field = Some(field);
        self
    }
}

/// Outcome of processing one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// The assistant's reply for this turn.
    pub message: String,
    /// True once every field is settled.
    pub is_complete: bool,
    /// Everything collected, present only on the completion turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_data: Option<BTreeMap<String, Value>>,
}

impl TurnOutcome {
    fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_complete: false,
            collected_data: None,
        }
    }

    fn complete(message: impl Into<String>, collected_data: Option<BTreeMap<String, Value>>) -> Self {
        Self {
            message: message.into(),
            is_complete: true,
            collected_data,
        }
    }
}

/// Errors surfaced by the orchestrator.
///
/// Model failures never appear here: an unavailable or misbehaving
/// model degrades to fallback questions and apology turns instead of
/// failing the conversation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// `start` has not been called yet.
    #[error("conversation not started")]
    NotStarted,

    /// Field registry failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Conversation-driving engine over a field registry and an extraction
/// model.
pub struct CollectionOrchestrator<R, M>
where
    R: FieldRegistry,
    M: ExtractionModel,
{
    registry: Arc<R>,
    model: Arc<M>,
    max_batch_size: usize,
    confidence_threshold: f64,
    session: Mutex<SessionState>,
    events: broadcast::Sender<ConversationTurn>,
}

/// Mutable context of the running session, behind one lock so a turn is
/// processed to the end before the next one starts.
#[derive(Debug, Default)]
struct SessionState {
    conversation_id: ConversationId,
    collection: CollectionState,
    transcript: Vec<ConversationTurn>,
}

impl<R, M> CollectionOrchestrator<R, M>
where
    R: FieldRegistry,
    M: ExtractionModel,
{
    /// Creates an orchestrator with the default batch size and
    /// confidence threshold.
    pub fn new(registry: Arc<R>, model: Arc<M>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registry,
            model,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            session: Mutex::new(SessionState::default()),
            events,
        }
    }

    /// Overrides how many simple fields one question may bundle.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Overrides the confidence bar extracted values must clear. The
    /// comparison is strict, so a row at exactly the threshold is
    /// rejected.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Subscribes to transcript appends.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationTurn> {
        self.events.subscribe()
    }

    /// Loads a form definition and asks the first question.
    ///
    /// Calling `start` again discards the previous session and begins a
    /// fresh one. An unavailable model is narrated, not fatal: questions
    /// degrade to templated fallbacks later on.
    pub async fn start(&self, definition: FormDefinition) -> Result<(), OrchestratorError> {
        let mut session = self.session.lock().await;
        session.conversation_id = ConversationId::new();
        session.collection.reset();
        session.transcript.clear();
        tracing::debug!(conversation = %session.conversation_id, "starting collection");

        self.append(
            &mut session,
            ConversationTurn::system("Loading Form Conversational AI..."),
        );
        match self.model.ensure_ready().await {
            Ok(notice) => self.append(&mut session, ConversationTurn::system(notice)),
            Err(err) => {
                tracing::warn!("extraction model unavailable: {}", err);
                self.append(
                    &mut session,
                    ConversationTurn::system("Conversational AI is unavailable"),
                );
            }
        }

        self.append(&mut session, ConversationTurn::system("Loading form..."));
        self.append(
            &mut session,
            ConversationTurn::system("Waiting for form to ready..."),
        );
        self.registry.load(definition).await?;
        self.append(&mut session, ConversationTurn::system("Form ready"));

        self.request_next_batch(&mut session).await?;
        Ok(())
    }

    /// Processes one user reply and returns the assistant's response.
    ///
    /// Widget replies (`field` set) skip extraction and apply the content
    /// to that field with full confidence. Image replies are extracted
    /// against every fillable field rather than just the current batch.
    pub async fn process_user_response(
        &self,
        response: UserResponse,
    ) -> Result<TurnOutcome, OrchestratorError> {
        let mut session = self.session.lock().await;

        match session.collection.phase() {
            CollectionPhase::Idle => return Err(OrchestratorError::NotStarted),
            CollectionPhase::Complete => {
                self.append(&mut session, ConversationTurn::user(&response.content));
                let thanks = self.registry.thank_you_message().await?;
                self.append(&mut session, ConversationTurn::assistant_html(&thanks));
                return Ok(TurnOutcome::complete(thanks, None));
            }
            CollectionPhase::AwaitingReply => {}
        }

        self.append(&mut session, ConversationTurn::user(&response.content));

        let rows = match &response.field {
            Some(field_id) => self.direct_rows(field_id, &response.content).await?,
            None => {
                self.append(
                    &mut session,
                    ConversationTurn::system("Extracting data from user response..."),
                );
                match self.extract_rows(&session, &response).await? {
                    Ok(rows) => rows,
                    Err(outcome) => {
                        self.append(&mut session, ConversationTurn::assistant(&outcome));
                        return Ok(TurnOutcome::reply(outcome));
                    }
                }
            }
        };

        let report = session
            .collection
            .merge_extracted_at(&rows, self.confidence_threshold);
        tracing::debug!(
            accepted = report.accepted.len(),
            skipped = report.skipped.len(),
            "merged extraction result"
        );

        if !report.accepted_any() {
            self.append(&mut session, ConversationTurn::assistant(NOT_UNDERSTOOD));
            return Ok(TurnOutcome::reply(NOT_UNDERSTOOD));
        }

        // Import is best-effort; validation below works off read-back
        // state either way.
        if let Err(err) = self
            .registry
            .import_data(session.collection.collected())
            .await
        {
            tracing::warn!("import into registry failed: {}", err);
        }

        let invalid = self.registry.invalid_fields().await?;
        if let Some(action) = RetryAction::for_invalid(&invalid) {
            return Ok(self.prompt_retry(&mut session, action));
        }

        self.request_next_batch(&mut session).await
    }

    /// Progress over the loaded form; all zeros before `start`.
    pub async fn progress(&self) -> Result<CollectionProgress, OrchestratorError> {
        let session = self.session.lock().await;
        let fillable = match self.registry.fillable_fields().await {
            Ok(fillable) => fillable,
            Err(RegistryError::NotLoaded) => return Ok(CollectionProgress::compute([], &[])),
            Err(err) => return Err(err.into()),
        };
        Ok(CollectionProgress::compute(
            session.collection.collected_names(),
            &fillable,
        ))
    }

    /// Identifier of the current conversation; changes on `start` and
    /// `reset`.
    pub async fn conversation_id(&self) -> ConversationId {
        self.session.lock().await.conversation_id
    }

    /// Snapshot of the transcript so far.
    pub async fn conversation_history(&self) -> Vec<ConversationTurn> {
        self.session.lock().await.transcript.clone()
    }

    /// Snapshot of everything collected so far.
    pub async fn collected_data(&self) -> BTreeMap<String, Value> {
        self.session.lock().await.collection.collected_snapshot()
    }

    /// True once the summary turn has been emitted.
    pub async fn is_complete(&self) -> bool {
        self.session.lock().await.collection.is_complete()
    }

    /// Clears the session context and transcript.
    ///
    /// The registry keeps whatever was imported; a subsequent `start`
    /// loads a fresh definition anyway.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.conversation_id = ConversationId::new();
        session.collection.reset();
        session.transcript.clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Turn internals
    // ─────────────────────────────────────────────────────────────────────

    /// Appends a turn to the transcript and broadcasts it.
    fn append(&self, session: &mut SessionState, turn: ConversationTurn) {
        session.transcript.push(turn.clone());
        let _ = self.events.send(turn);
    }

    /// Builds the single full-confidence row for a widget reply.
    ///
    /// An id no registry field matches yields no rows, which the caller
    /// reports as a not-understood turn.
    async fn direct_rows(
        &self,
        field_id: &FieldId,
        content: &str,
    ) -> Result<Vec<ExtractedValue>, OrchestratorError> {
        match self.registry.field(field_id).await? {
            Some(field) => Ok(vec![ExtractedValue::certain(
                field.name,
                Value::String(content.to_string()),
            )]),
            None => {
                tracing::warn!(field = %field_id, "widget reply for unknown field");
                Ok(Vec::new())
            }
        }
    }

    /// Runs model extraction for a free-form reply.
    ///
    /// The inner result separates model failure (right side, an apology
    /// message) from registry failure, which is genuinely an error.
    async fn extract_rows(
        &self,
        session: &SessionState,
        response: &UserResponse,
    ) -> Result<Result<Vec<ExtractedValue>, String>, OrchestratorError> {
        let fields = if response.image.is_some() {
            self.registry.fillable_fields().await?
        } else {
            let mut fields = Vec::new();
            if let Some(ids) = session.collection.current_requested_fields() {
                for id in ids {
                    if let Some(field) = self.registry.field(id).await? {
                        fields.push(field);
                    }
                }
            }
            fields
        };

        let schema = ExtractionSchema::for_fields(&fields);
        match self
            .model
            .extract_data(&schema, &response.content, response.image.as_ref())
            .await
        {
            Ok(rows) => Ok(Ok(rows)),
            Err(err) => {
                tracing::warn!("extraction failed: {}", err);
                Ok(Err(NOT_UNDERSTOOD.to_string()))
            }
        }
    }

    /// Emits the follow-up for the first invalid field and narrows the
    /// outstanding batch to it.
    fn prompt_retry(&self, session: &mut SessionState, action: RetryAction) -> TurnOutcome {
        let outcome = match &action {
            RetryAction::Widget(field) => {
                let message = field.label_text().to_string();
                self.append(
                    session,
                    ConversationTurn::widget_prompt(&message, field.clone()),
                );
                TurnOutcome::reply(message)
            }
            RetryAction::Text(field) => {
                let reason = field
                    .validation_message
                    .clone()
                    .unwrap_or_else(|| "invalid value".to_string());
                let message = format!("Invalid field: {}, reason: {}", field.label_text(), reason);
                self.append(session, ConversationTurn::assistant(&message));
                TurnOutcome::reply(message)
            }
        };
        session
            .collection
            .request_fields(vec![action.field().id.clone()]);
        outcome
    }

    /// Selects the next batch and puts its question on the wire, or
    /// finishes the conversation when nothing is left to fill.
    async fn request_next_batch(
        &self,
        session: &mut SessionState,
    ) -> Result<TurnOutcome, OrchestratorError> {
        let fillable = self.registry.fillable_fields().await?;
        if fillable.is_empty() {
            return Ok(self.finish(session));
        }

        let batch = select_batch(&fillable, self.max_batch_size);

        let outcome = if batch.len() == 1 && batch[0].is_complex() {
            let field = batch[0].clone();
            let message = field.label_text().to_string();
            self.append(session, ConversationTurn::widget_prompt(&message, field));
            TurnOutcome::reply(message)
        } else {
            self.append(
                session,
                ConversationTurn::system("Generating question for selected fields..."),
            );
            let message = self.question_for(batch).await;
            self.append(
                session,
                ConversationTurn::system(format!("Generated question: {}", message)),
            );
            self.append(session, ConversationTurn::assistant(&message));
            TurnOutcome::reply(message)
        };

        let ids = batch.iter().map(|field| field.id.clone()).collect();
        session.collection.request_fields(ids);
        Ok(outcome)
    }

    /// Asks the model to phrase a question for `batch`, with a templated
    /// fallback when the model cannot.
    async fn question_for(&self, batch: &[Field]) -> String {
        let schema = ExtractionSchema::for_fields(batch);
        match self.model.smart_question(&schema).await {
            Ok(question) => question.message,
            Err(err) => {
                tracing::warn!("smart question failed, using fallback: {}", err);
                fallback_question(batch)
            }
        }
    }

    /// Emits the one summary turn and marks the session complete.
    fn finish(&self, session: &mut SessionState) -> TurnOutcome {
        let collected = session.collection.collected_snapshot();
        let summary = if collected.is_empty() {
            "All done!".to_string()
        } else {
            let pairs = collected
                .iter()
                .map(|(name, value)| format!("{}: {}", name, render_value(value)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("I've collected: {}", pairs)
        };
        let message = format!(
            "Perfect! {} Your form is now complete and ready to submit.",
            summary
        );
        self.append(session, ConversationTurn::assistant(&message));
        session.collection.complete();
        TurnOutcome::complete(message, Some(collected))
    }
}

/// Templated question used when the model cannot produce one.
fn fallback_question(fields: &[Field]) -> String {
    let labels = fields
        .iter()
        .map(|field| field.label_text())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "I'd like to collect some information: {}. Could you please provide these details?",
        labels
    )
}

/// Renders a collected value for the summary line.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::{LlmExtractionModel, MockChatModel, MockFailure};
    use crate::adapters::registry::InMemoryFieldRegistry;
    use crate::domain::conversation::{MessageKind, Sender};
    use serde_json::json;

    fn orchestrator(
        chat: MockChatModel,
    ) -> CollectionOrchestrator<InMemoryFieldRegistry, LlmExtractionModel<MockChatModel>> {
        CollectionOrchestrator::new(
            Arc::new(InMemoryFieldRegistry::new()),
            Arc::new(LlmExtractionModel::new(chat)),
        )
    }

    fn two_text_fields() -> FormDefinition {
        FormDefinition::from_value(json!({
            "title": "Basics",
            "items": [
                {"type": "text-input", "name": "full_name", "label": "Full name"},
                {"type": "email", "name": "email", "label": "Email"}
            ]
        }))
        .unwrap()
    }

    fn question_reply(message: &str, ids: &[&str]) -> String {
        json!({"message": message, "requestedFields": ids}).to_string()
    }

    fn extraction_reply(rows: Value) -> String {
        rows.to_string()
    }

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn replying_before_start_is_an_error() {
            let engine = orchestrator(MockChatModel::new());
            let result = engine.process_user_response(UserResponse::text("hi")).await;
            assert!(matches!(result, Err(OrchestratorError::NotStarted)));
        }

        #[tokio::test]
        async fn start_narrates_loading_and_asks_the_first_question() {
            let chat = MockChatModel::new()
                .with_reply(question_reply("What's your name and email?", &["text-input-full_name", "email-email"]));
            let engine = orchestrator(chat);

            engine.start(two_text_fields()).await.unwrap();

            let history = engine.conversation_history().await;
            let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
            assert_eq!(contents[0], "Loading Form Conversational AI...");
            assert_eq!(contents[2], "Loading form...");
            assert_eq!(contents[3], "Waiting for form to ready...");
            assert_eq!(contents[4], "Form ready");
            assert_eq!(contents[5], "Generating question for selected fields...");
            assert_eq!(
                contents[6],
                "Generated question: What's your name and email?"
            );

            let last = history.last().unwrap();
            assert_eq!(last.sender, Sender::Assistant);
            assert_eq!(last.content, "What's your name and email?");
        }

        #[tokio::test]
        async fn unavailable_model_is_narrated_not_fatal() {
            let registry = Arc::new(InMemoryFieldRegistry::new());

            struct DownModel;
            #[async_trait::async_trait]
            impl crate::ports::ExtractionModel for DownModel {
                async fn ensure_ready(&self) -> Result<String, crate::ports::ModelError> {
                    Err(crate::ports::ModelError::unavailable("no backend"))
                }
                async fn smart_question(
                    &self,
                    _schema: &ExtractionSchema,
                ) -> Result<crate::domain::extraction::SmartQuestion, crate::ports::ModelError>
                {
                    Err(crate::ports::ModelError::unavailable("no backend"))
                }
                async fn extract_data(
                    &self,
                    _schema: &ExtractionSchema,
                    _text: &str,
                    _image: Option<&ImageAttachment>,
                ) -> Result<Vec<ExtractedValue>, crate::ports::ModelError> {
                    Err(crate::ports::ModelError::unavailable("no backend"))
                }
            }

            let engine = CollectionOrchestrator::new(registry, Arc::new(DownModel));
            engine.start(two_text_fields()).await.unwrap();

            let history = engine.conversation_history().await;
            assert!(history
                .iter()
                .any(|t| t.content == "Conversational AI is unavailable"));
            // question generation degraded to the fallback template
            let last = history.last().unwrap();
            assert!(last.content.starts_with("I'd like to collect some information:"));
            assert!(last.content.contains("Full name"));
            assert!(last.content.contains("Email"));
        }

        #[tokio::test]
        async fn reset_clears_history_and_collected_data() {
            let chat = MockChatModel::new().with_reply(question_reply("Q?", &[]));
            let engine = orchestrator(chat);
            engine.start(two_text_fields()).await.unwrap();
            let before = engine.conversation_id().await;

            engine.reset().await;

            assert!(engine.conversation_history().await.is_empty());
            assert!(engine.collected_data().await.is_empty());
            assert_ne!(engine.conversation_id().await, before);
            let result = engine.process_user_response(UserResponse::text("hi")).await;
            assert!(matches!(result, Err(OrchestratorError::NotStarted)));
        }
    }

    mod replies {
        use super::*;

        #[tokio::test]
        async fn accepted_values_are_imported_and_the_next_question_asked() {
            let chat = MockChatModel::new()
                .with_reply(question_reply("Name and email?", &[]))
                .with_reply(extraction_reply(json!([
                    {"name": "full_name", "value": "Ada Lovelace", "confidence": 0.95, "reasoning": ""},
                    {"name": "email", "value": "ada@example.org", "confidence": 0.9, "reasoning": ""}
                ])));
            let engine = orchestrator(chat);
            engine.start(two_text_fields()).await.unwrap();

            let outcome = engine
                .process_user_response(UserResponse::text(
                    "I'm Ada Lovelace, ada@example.org",
                ))
                .await
                .unwrap();

            assert!(outcome.is_complete);
            assert!(outcome.message.starts_with("Perfect!"));
            assert!(outcome.message.contains("full_name: Ada Lovelace"));
            assert!(outcome.message.contains("email: ada@example.org"));
            assert_eq!(
                outcome.collected_data.unwrap()["email"],
                json!("ada@example.org")
            );
        }

        #[tokio::test]
        async fn nothing_accepted_keeps_the_batch_and_apologizes() {
            let chat = MockChatModel::new()
                .with_reply(question_reply("Name and email?", &[]))
                .with_reply(extraction_reply(json!([
                    {"name": "full_name", "value": null, "confidence": 0.0, "reasoning": "Information not found in the provided content."}
                ])));
            let engine = orchestrator(chat);
            engine.start(two_text_fields()).await.unwrap();

            let outcome = engine
                .process_user_response(UserResponse::text("what do you mean"))
                .await
                .unwrap();

            assert_eq!(
                outcome.message,
                "I didn't quite understand that. Could you please try again?"
            );
            assert!(!outcome.is_complete);
            assert!(engine.collected_data().await.is_empty());
        }

        #[tokio::test]
        async fn extraction_failure_apologizes_instead_of_erroring() {
            let chat = MockChatModel::new()
                .with_reply(question_reply("Name and email?", &[]))
                .with_failure(MockFailure::Timeout { timeout_secs: 60 });
            let engine = orchestrator(chat);
            engine.start(two_text_fields()).await.unwrap();

            let outcome = engine
                .process_user_response(UserResponse::text("Ada, ada@example.org"))
                .await
                .unwrap();

            assert_eq!(
                outcome.message,
                "I didn't quite understand that. Could you please try again?"
            );
        }

        #[tokio::test]
        async fn widget_reply_bypasses_extraction() {
            let definition = FormDefinition::from_value(json!({
                "items": [
                    {"type": "checkbox", "name": "newsletter", "label": "Newsletter?"},
                ]
            }))
            .unwrap();

            let chat = MockChatModel::new();
            let engine = orchestrator(chat.clone());
            engine.start(definition).await.unwrap();

            // complex singleton went out as a widget prompt, no model call
            assert_eq!(chat.call_count(), 0);
            let history = engine.conversation_history().await;
            let prompt = history.last().unwrap();
            assert_eq!(prompt.kind, MessageKind::Boolean);

            let outcome = engine
                .process_user_response(
                    UserResponse::text("true")
                        .for_field(prompt.field.as_ref().unwrap().id.clone()),
                )
                .await
                .unwrap();

            // still no model call; value applied and form completed
            assert_eq!(chat.call_count(), 0);
            assert!(outcome.is_complete);
            assert_eq!(engine.collected_data().await["newsletter"], json!("true"));
        }
    }

    mod completion {
        use super::*;

        #[tokio::test]
        async fn empty_form_completes_immediately_with_all_done() {
            let engine = orchestrator(MockChatModel::new());
            let definition = FormDefinition::from_value(json!({"items": []})).unwrap();

            engine.start(definition).await.unwrap();

            assert!(engine.is_complete().await);
            let history = engine.conversation_history().await;
            assert_eq!(
                history.last().unwrap().content,
                "Perfect! All done! Your form is now complete and ready to submit."
            );
        }

        #[tokio::test]
        async fn replies_after_completion_get_the_thank_you_message() {
            let engine = orchestrator(MockChatModel::new());
            let definition = FormDefinition::from_value(json!({
                "thankYouMessage": "<p>See you soon!</p>",
                "items": []
            }))
            .unwrap();
            engine.start(definition).await.unwrap();

            let outcome = engine
                .process_user_response(UserResponse::text("hello again"))
                .await
                .unwrap();

            assert!(outcome.is_complete);
            assert_eq!(outcome.message, "<p>See you soon!</p>");
            assert!(outcome.collected_data.is_none());

            let last = engine.conversation_history().await.pop().unwrap();
            assert_eq!(last.kind, MessageKind::Html);
        }

        #[tokio::test]
        async fn summary_renders_values_without_json_quoting() {
            let chat = MockChatModel::new()
                .with_reply(question_reply("Q?", &[]))
                .with_reply(extraction_reply(json!([
                    {"name": "full_name", "value": "Ada", "confidence": 0.9, "reasoning": ""},
                    {"name": "email", "value": "a@b.se", "confidence": 0.9, "reasoning": ""}
                ])));
            let engine = orchestrator(chat);
            engine.start(two_text_fields()).await.unwrap();

            let outcome = engine
                .process_user_response(UserResponse::text("Ada, a@b.se"))
                .await
                .unwrap();

            assert_eq!(
                outcome.message,
                "Perfect! I've collected: email: a@b.se, full_name: Ada \
                 Your form is now complete and ready to submit."
            );
        }
    }

    mod events {
        use super::*;

        #[tokio::test]
        async fn every_append_is_broadcast_in_order() {
            let chat = MockChatModel::new().with_reply(question_reply("Q?", &[]));
            let engine = orchestrator(chat);
            let mut updates = engine.subscribe();

            engine.start(two_text_fields()).await.unwrap();

            let history = engine.conversation_history().await;
            for expected in &history {
                let received = updates.recv().await.unwrap();
                assert_eq!(received.id, expected.id);
                assert_eq!(received.content, expected.content);
            }
        }
    }

    mod value_rendering {
        use super::*;

        #[test]
        fn strings_render_bare_and_arrays_join_with_commas() {
            assert_eq!(render_value(&json!("Ada")), "Ada");
            assert_eq!(render_value(&json!(42)), "42");
            assert_eq!(render_value(&json!(true)), "true");
            assert_eq!(render_value(&json!(["a", "b"])), "a,b");
        }
    }
}
