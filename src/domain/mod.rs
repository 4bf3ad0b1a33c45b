//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `form` - Field model, form definitions, and the extraction schema projection
//! - `conversation` - Transcript turns and collection progress
//! - `extraction` - Model-output recovery and typed extraction results
//! - `collection` - Batch selection policy and per-session state

pub mod collection;
pub mod conversation;
pub mod extraction;
pub mod form;
pub mod foundation;
