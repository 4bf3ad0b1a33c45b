//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `FieldRegistry` - The form-validation engine: field state, fillable
//!   and invalid snapshots, value import
//! - `ChatModel` - Raw LLM completions (hosted or mock)
//! - `ExtractionModel` - Field-aware question phrasing and answer
//!   extraction built on top of a chat model

mod chat_model;
mod extraction_model;
mod field_registry;

pub use chat_model::{ChatModel, ChatRequest, ChatResponse, ImageAttachment, ModelError, ModelInfo};
pub use extraction_model::ExtractionModel;
pub use field_registry::{FieldRegistry, RegistryError, RegistryStats};
