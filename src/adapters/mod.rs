//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `model` - Chat backends (Anthropic, mock) and the LLM extraction pipeline
//! - `registry` - Field registry implementations (in-memory)

pub mod model;
pub mod registry;

pub use model::{AnthropicChatModel, AnthropicConfig, LlmExtractionModel, MockChatModel};
pub use registry::InMemoryFieldRegistry;
