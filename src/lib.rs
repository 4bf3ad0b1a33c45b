//! Form Sherpa - Conversational Form-Filling Engine
//!
//! This crate fills web-style forms through a guided conversation: fields
//! are batched into questions, answers run through an LLM extractor, and
//! accepted values are imported into a validating field registry until the
//! form is complete.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
