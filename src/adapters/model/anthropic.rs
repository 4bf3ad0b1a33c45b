//! Anthropic backend for the chat model port.
//!
//! Sends non-streaming Messages API requests. Image attachments are
//! encoded as base64 content blocks alongside the text.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let model = AnthropicChatModel::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::ports::{ChatModel, ChatRequest, ChatResponse, ModelError, ModelInfo};

/// Configuration for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds a backend configuration from the loaded app config.
    ///
    /// Returns `None` when no API key is set, which callers treat as
    /// "run without a hosted model".
    pub fn from_app(ai: &crate::config::AiConfig) -> Option<Self> {
        let key = ai.anthropic_api_key.as_deref().filter(|k| !k.is_empty())?;
        Some(
            Self::new(key)
                .with_model(&ai.model)
                .with_base_url(&ai.base_url)
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries),
        )
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicChatModel {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicChatModel {
    /// Creates a new backend with the given configuration.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    /// Converts our request to Anthropic's wire format.
    fn to_wire_request(&self, request: &ChatRequest) -> WireRequest {
        let content = match &request.image {
            Some(image) => MessageContent::Blocks(vec![
                ContentPart::Text {
                    text: request.user_content.clone(),
                },
                ContentPart::Image {
                    source: ImageSource {
                        source_type: "base64".to_string(),
                        media_type: image.media_type.clone(),
                        data: general_purpose::STANDARD.encode(&image.data),
                    },
                },
            ]),
            None => MessageContent::Text(request.user_content.clone()),
        };

        WireRequest {
            model: self.config.model.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content,
            }],
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(4096),
            temperature: request.temperature,
        }
    }

    /// Sends a request and maps transport failures.
    async fn send_request(&self, request: &ChatRequest) -> Result<Response, ModelError> {
        let wire_request = self.to_wire_request(request);

        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    ModelError::network(format!("Connection failed: {}", e))
                } else {
                    ModelError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and maps errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, ModelError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(ModelError::AuthenticationFailed),
            429 => {
                let retry_after = Self::parse_retry_after(&error_body);
                Err(ModelError::rate_limited(retry_after))
            }
            400 => Err(ModelError::invalid_request(error_body)),
            500..=599 => Err(ModelError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(ModelError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(msg) = parsed.get("error").and_then(|e| e.get("message")) {
                if let Some(s) = msg.as_str() {
                    // Look for "try again in Xs" hints in the message
                    if let Some(idx) = s.find("try again in ") {
                        let rest = &s[idx + 13..];
                        if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                            if let Ok(secs) = rest[..num_end].parse::<u32>() {
                                return secs;
                            }
                        }
                    }
                }
            }
        }
        60 // Anthropic tends to have longer rate limit windows
    }

    /// Parses a successful response body.
    async fn parse_response(&self, response: Response) -> Result<ChatResponse, ModelError> {
        let response = self.handle_response_status(response).await?;

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| ModelError::parse(format!("Failed to parse response: {}", e)))?;

        let content = wire_response
            .content
            .into_iter()
            .filter_map(|block| {
                if block.block_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(ChatResponse {
            content,
            model: wire_response.model,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ModelError> {
        let mut last_error = ModelError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&request).await {
                Ok(response) => match self.parse_response(response).await {
                    Ok(completion) => return Ok(completion),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("anthropic", &self.config.model).with_images(true)
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    content: Vec<WireContentBlock>,
}

#[derive(Debug, Deserialize)]
struct WireContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ImageAttachment;

    #[test]
    fn config_builder_works() {
        let config = AnthropicConfig::new("test-key")
            .with_model("claude-3-haiku-20240307")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_from_app_requires_a_key() {
        let mut ai = crate::config::AiConfig::default();
        assert!(AnthropicConfig::from_app(&ai).is_none());

        ai.anthropic_api_key = Some("sk-ant-xxx".to_string());
        ai.timeout_secs = 30;
        let config = AnthropicConfig::from_app(&ai).unwrap();
        assert_eq!(config.api_key(), "sk-ant-xxx");
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn request_without_an_image_uses_plain_text_content() {
        let model = AnthropicChatModel::new(AnthropicConfig::new("test"));
        let request = ChatRequest::new("What's your name?").with_system_prompt("JSON only");

        let wire = model.to_wire_request(&request);
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "What's your name?");
        assert_eq!(json["system"], "JSON only");
        assert_eq!(json["max_tokens"], 4096);
    }

    #[test]
    fn request_embeds_the_image_as_base64_blocks() {
        let model = AnthropicChatModel::new(AnthropicConfig::new("test"));
        let request = ChatRequest::new("extract from this")
            .with_image(ImageAttachment::png(vec![1, 2, 3]));

        let wire = model.to_wire_request(&request);
        let json = serde_json::to_value(&wire).unwrap();

        let blocks = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[0]["text"], "extract from this");
        assert_eq!(blocks[1]["type"], "image");
        assert_eq!(blocks[1]["source"]["type"], "base64");
        assert_eq!(blocks[1]["source"]["media_type"], "image/png");
        assert_eq!(
            blocks[1]["source"]["data"],
            general_purpose::STANDARD.encode([1u8, 2, 3])
        );
    }

    #[test]
    fn absent_options_are_not_serialized() {
        let model = AnthropicChatModel::new(AnthropicConfig::new("test"));
        let wire = model.to_wire_request(&ChatRequest::new("hi"));
        let json = serde_json::to_value(&wire).unwrap();

        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn parse_retry_after_reads_the_hint() {
        let error = r#"{"error":{"message":"Rate limit exceeded, try again in 30s"}}"#;
        assert_eq!(AnthropicChatModel::parse_retry_after(error), 30);
    }

    #[test]
    fn parse_retry_after_defaults_to_a_minute() {
        let error = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        assert_eq!(AnthropicChatModel::parse_retry_after(error), 60);
    }

    #[test]
    fn info_reports_image_support() {
        let model = AnthropicChatModel::new(
            AnthropicConfig::new("test").with_model("claude-3-haiku-20240307"),
        );

        let info = model.info();
        assert_eq!(info.name, "anthropic");
        assert_eq!(info.model, "claude-3-haiku-20240307");
        assert!(info.supports_images);
    }

    #[test]
    fn messages_url_joins_the_base() {
        let model = AnthropicChatModel::new(
            AnthropicConfig::new("test").with_base_url("https://proxy.example.com"),
        );
        assert_eq!(model.messages_url(), "https://proxy.example.com/v1/messages");
    }
}
