//! Chat and extraction model adapters.

mod anthropic;
mod llm;
mod mock;
mod prompts;

pub use anthropic::{AnthropicChatModel, AnthropicConfig};
pub use llm::LlmExtractionModel;
pub use mock::{MockChatModel, MockFailure, MockReply};
pub use prompts::{extraction_prompt, smart_question_prompt, JSON_ONLY_SYSTEM_PROMPT};
