//! Conversation transcript primitives: immutable turns and progress.

mod progress;
mod turn;

pub use progress::CollectionProgress;
pub use turn::{ConversationTurn, MessageKind, Sender};
