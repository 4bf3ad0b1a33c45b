//! Application layer - the collection orchestrator.
//!
//! This layer coordinates domain operations across the ports: it owns
//! the conversation session and drives the field registry and the
//! extraction model from one user turn to the next.

pub mod orchestrator;

pub use orchestrator::{CollectionOrchestrator, OrchestratorError, TurnOutcome, UserResponse};
