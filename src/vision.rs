use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;

use crate::error::AnalysisError;
use crate::model::FoodDescription;
use crate::providers::{
    ChatProvider, ChatRequest, ProviderError, VISION_ANALYSIS_PROMPT, VISION_USER_INSTRUCTION,
};

pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(30);

/// First pipeline stage: turn an image URL into a prose meal description
#[async_trait]
pub trait FoodVision: Send + Sync {
    async fn analyze(&self, image_url: &str) -> Result<FoodDescription, AnalysisError>;
}

/// Calls a vision-capable chat model once per image, without retries
pub struct VisionService {
    provider: Arc<dyn ChatProvider>,
    model: String,
    timeout: Duration,
}

impl VisionService {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        VisionService {
            provider,
            model: model.into(),
            timeout: DEFAULT_VISION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(&self, image_url: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                json!({"role": "system", "content": VISION_ANALYSIS_PROMPT}),
                json!({
                    "role": "user",
                    "content": [
                        {"type": "text", "text": VISION_USER_INSTRUCTION},
                        {"type": "image_url", "image_url": {"url": image_url}}
                    ]
                }),
            ],
            timeout: Some(self.timeout),
        }
    }
}

#[async_trait]
impl FoodVision for VisionService {
    async fn analyze(&self, image_url: &str) -> Result<FoodDescription, AnalysisError> {
        info!(
            "Requesting food description from {} via {}",
            self.model,
            self.provider.provider_name()
        );

        let content = self
            .provider
            .complete(self.build_request(image_url))
            .await
            .map_err(vision_error)?;

        debug!("Vision description: {}", content);
        Ok(FoodDescription::new(content))
    }
}

fn vision_error(err: ProviderError) -> AnalysisError {
    let message = match err {
        ProviderError::Upstream(message) => format!("Vision model error: {}", message),
        other => other.to_string(),
    };
    AnalysisError::VisionService(message)
}
