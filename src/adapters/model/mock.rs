//! Mock chat model for testing.
//!
//! Configurable to return scripted completions, simulate latency, or
//! inject errors, so conversation flows can be exercised without a
//! hosted model.
//!
//! # Example
//!
//! ```ignore
//! let model = MockChatModel::new()
//!     .with_reply(r#"{"message": "What's your name?"}"#)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = model.complete(request).await?;
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::ports::{ChatModel, ChatRequest, ChatResponse, ModelError, ModelInfo};

/// Chat model that replays a scripted sequence of replies.
#[derive(Debug, Clone)]
pub struct MockChatModel {
    /// Scripted replies, consumed in order.
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    info: ModelInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

/// A scripted mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return a completion with this content.
    Success(String),
    /// Return an error.
    Error(MockFailure),
}

/// Failure modes the mock can inject.
#[derive(Debug, Clone)]
pub enum MockFailure {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
    InvalidRequest { message: String },
}

impl From<MockFailure> for ModelError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::RateLimited { retry_after_secs } => {
                ModelError::rate_limited(retry_after_secs)
            }
            MockFailure::Unavailable { message } => ModelError::unavailable(message),
            MockFailure::AuthenticationFailed => ModelError::AuthenticationFailed,
            MockFailure::Network { message } => ModelError::network(message),
            MockFailure::Timeout { timeout_secs } => ModelError::Timeout { timeout_secs },
            MockFailure::InvalidRequest { message } => ModelError::invalid_request(message),
        }
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            info: ModelInfo::new("mock", "mock-model-1").with_images(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a completion with the given content.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Success(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_failure(self, failure: MockFailure) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(failure));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the model info to report.
    pub fn with_info(mut self, info: ModelInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded requests.
    pub fn recorded_calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Pops the next scripted reply, or a default once the script runs out.
    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockReply::Success("{}".to_string()))
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ModelError> {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Success(content) => Ok(ChatResponse {
                content,
                model: self.info.model.clone(),
            }),
            MockReply::Error(failure) => Err(failure.into()),
        }
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}
