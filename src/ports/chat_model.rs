//! Chat Model Port - Interface for LLM chat integrations.
//!
//! This port abstracts the raw completion call against a hosted or local
//! language model, so the extraction layer can prompt without coupling to
//! a specific provider API.
//!
//! # Design
//!
//! - Single-shot, non-streaming completions; field collection never
//!   renders partial answers
//! - Optional image attachment on the user turn for image-based replies
//! - Error types for the common failure modes (rate limits, timeouts,
//!   bad credentials), with a retryability classification

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for chat-model completions.
///
/// Implementations connect to external model services and translate
/// between the provider-specific API and these request/response types.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a single completion.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ModelError>;

    /// Get model information (name, capabilities).
    fn info(&self) -> ModelInfo;
}

/// Request for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// System prompt guiding model behavior.
    pub system_prompt: Option<String>,
    /// The user turn's text content.
    pub user_content: String,
    /// Optional image shown alongside the text.
    pub image: Option<ImageAttachment>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Response randomness (0.0 = deterministic).
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Creates a request carrying only user text.
    pub fn new(user_content: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_content: user_content.into(),
            image: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Attaches an image to the user turn.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Unencoded image bytes; adapters encode as their wire requires.
    pub data: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    pub fn png(data: Vec<u8>) -> Self {
        Self::new("image/png", data)
    }

    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new("image/jpeg", data)
    }
}

/// Response from one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
}

/// Model information and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider name (e.g. "anthropic", "mock").
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Whether image attachments are supported.
    pub supports_images: bool,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            supports_images: false,
        }
    }

    pub fn with_images(mut self, supports: bool) -> Self {
        self.supports_images = supports;
        self
    }
}

/// Chat model errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Model or session is unavailable.
    #[error("model unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Model output could not be understood.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ModelError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::Unavailable { .. }
                | ModelError::RateLimited { .. }
                | ModelError::Network(_)
                | ModelError::Timeout { .. }
        )
    }
}
