mod open_router;
mod prompt;

pub use open_router::{completion_content, OpenRouterProvider, DEFAULT_BASE_URL};
pub use prompt::{NUTRITION_STRUCTURING_PROMPT, VISION_ANALYSIS_PROMPT, VISION_USER_INSTRUCTION};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// One chat completion call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    /// Chat turns, already in the wire format
    pub messages: Vec<Value>,
    /// Per-call network timeout
    pub timeout: Option<Duration>,
}

/// Errors from a single chat completion call
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The upstream answered with an error object instead of a completion
    #[error("Model error: {0}")]
    Upstream(String),

    #[error("Unexpected response format: {0}")]
    UnexpectedShape(String),
}

/// Unified trait for chat completion backends
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name (e.g., "openrouter")
    fn provider_name(&self) -> &str;

    /// Send one chat request and return the first choice's text content
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}
