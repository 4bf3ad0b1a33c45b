//! Transcript turns.
//!
//! A turn is an immutable record of one message in the collection
//! conversation. The orchestrator appends turns on every state transition
//! or message emission; they are never mutated or removed afterwards.
//! Widget prompts carry the full field view so a UI can render the right
//! control without a registry round-trip.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, TurnId};
use crate::domain::form::{Field, WidgetKind};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Lifecycle narration (loading, extracting, ...).
    System,
    /// End-user input.
    User,
    /// Questions, prompts, and the completion summary.
    Assistant,
}

impl Sender {
    /// Returns true if a chat UI would normally render this sender.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

/// How a turn's content should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Pre-rendered markup (thank-you messages).
    Html,
    /// Yes/no widget.
    Boolean,
    /// Option-list widget.
    Choice,
    /// Dedicated input widget (date, file, range, color, ...).
    Field,
}

impl From<WidgetKind> for MessageKind {
    fn from(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Boolean => Self::Boolean,
            WidgetKind::Choice => Self::Choice,
            WidgetKind::Field => Self::Field,
        }
    }
}

/// One immutable entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub sender: Sender,
    pub content: String,
    pub kind: MessageKind,
    /// Present on widget prompts so the UI can render the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub created_at: Timestamp,
}

impl ConversationTurn {
    fn new(sender: Sender, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: TurnId::new(),
            sender,
            content: content.into(),
            kind,
            field: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates a system narration turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Sender::System, content, MessageKind::Text)
    }

    /// Creates a plain-text assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content, MessageKind::Text)
    }

    /// Creates an assistant turn carrying markup.
    pub fn assistant_html(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content, MessageKind::Html)
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content, MessageKind::Text)
    }

    /// Creates an assistant widget prompt for a single field.
    ///
    /// The kind follows the field's widget flavor; a simple field (which
    /// has none) degrades to plain text.
    pub fn widget_prompt(content: impl Into<String>, field: Field) -> Self {
        let kind = field
            .field_type
            .widget_kind()
            .map(MessageKind::from)
            .unwrap_or(MessageKind::Text);
        let mut turn = Self::new(Sender::Assistant, content, kind);
        turn.field = Some(field);
        turn
    }

    /// Returns true if this turn prompts through a widget.
    pub fn is_widget_prompt(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::Boolean | MessageKind::Choice | MessageKind::Field
        )
    }
}
