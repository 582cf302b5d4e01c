use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::error::AnalysisError;
use crate::model::FoodDescription;
use crate::providers::{ChatProvider, ChatRequest, NUTRITION_STRUCTURING_PROMPT};

pub const DEFAULT_STRUCTURING_TIMEOUT: Duration = Duration::from_secs(60);

const FENCE: &str = "```";

/// Second pipeline stage: reshape a meal description into nutrition JSON.
///
/// The returned value is loosely typed; `validation::validate_response`
/// decides whether it is a usable `NutritionAnalysis`.
#[async_trait]
pub trait NutritionStructurer: Send + Sync {
    async fn structure(&self, description: &FoodDescription) -> Result<Value, AnalysisError>;
}

pub struct NutritionService {
    provider: Arc<dyn ChatProvider>,
    model: String,
    timeout: Duration,
}

impl NutritionService {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
        NutritionService {
            provider,
            model: model.into(),
            timeout: DEFAULT_STRUCTURING_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NutritionStructurer for NutritionService {
    async fn structure(&self, description: &FoodDescription) -> Result<Value, AnalysisError> {
        info!("Structuring nutrition data with {}", self.model);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                json!({"role": "system", "content": NUTRITION_STRUCTURING_PROMPT}),
                json!({"role": "user", "content": description.as_str()}),
            ],
            timeout: Some(self.timeout),
        };

        let content = self.provider.complete(request).await.map_err(|e| {
            AnalysisError::NutritionService {
                message: format!("Structuring service error: {}", e),
                details: None,
            }
        })?;
        debug!("Structuring response: {}", content);

        parse_nutrition_json(&content)
    }
}

/// Strip markdown code fences and parse what is left as JSON
pub fn parse_nutrition_json(content: &str) -> Result<Value, AnalysisError> {
    let cleaned = strip_code_fences(content);

    serde_json::from_str(cleaned).map_err(|e| {
        warn!("Structuring model returned invalid JSON: {}", cleaned);
        AnalysisError::NutritionService {
            message: format!("Failed to parse JSON response: {}", e),
            details: Some(cleaned.to_string()),
        }
    })
}

/// Remove a leading fence line (with any language tag, e.g. ```json) and a
/// trailing fence, then trim. Text without fences only gets trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        // The info string runs to the end of the fence line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    let text = text.trim_end();
    text.strip_suffix(FENCE).unwrap_or(text).trim()
}
