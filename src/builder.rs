use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::nutrition::{NutritionService, DEFAULT_STRUCTURING_TIMEOUT};
use crate::pipelines::{AnalysisPipeline, DEFAULT_PIPELINE_TIMEOUT};
use crate::providers::{ChatProvider, OpenRouterProvider};
use crate::vision::{VisionService, DEFAULT_VISION_TIMEOUT};

/// Builder that wires the model clients into an [`AnalysisPipeline`]
#[derive(Debug, Default)]
pub struct FoodAnalyzerBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    vision_model: Option<String>,
    structuring_model: Option<String>,
    vision_timeout: Option<Duration>,
    structuring_timeout: Option<Duration>,
    pipeline_timeout: Option<Duration>,
    http_referer: Option<String>,
    app_title: Option<String>,
}

impl FoodAnalyzerBuilder {
    /// Start from a loaded configuration. Later setters override it.
    ///
    /// # Example
    /// ```no_run
    /// use nutrition_vision::{AppConfig, FoodAnalyzer};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AppConfig::load()?;
    /// let pipeline = FoodAnalyzer::builder().from_config(&config).build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(mut self, config: &AppConfig) -> Self {
        self.api_key = config.openrouter_api_key.clone();
        self.base_url = Some(config.base_url.clone());
        self.vision_model = Some(config.vision_model.clone());
        self.structuring_model = Some(config.structuring_model.clone());
        self.vision_timeout = Some(config.vision_timeout());
        self.structuring_timeout = Some(config.structuring_timeout());
        self.pipeline_timeout = Some(config.pipeline_timeout());
        self.http_referer = config.http_referer.clone();
        self.app_title = Some(config.app_title.clone());
        self
    }

    /// Set the API key directly instead of relying on OPENROUTER_API_KEY
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point the clients at another OpenAI-compatible endpoint
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the model used to describe the image
    ///
    /// # Example
    /// ```
    /// use nutrition_vision::FoodAnalyzer;
    ///
    /// let builder = FoodAnalyzer::builder()
    ///     .vision_model("openai/gpt-4o")
    ///     .structuring_model("openai/gpt-4o-mini");
    /// ```
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    /// Set the model used to turn the description into JSON
    pub fn structuring_model(mut self, model: impl Into<String>) -> Self {
        self.structuring_model = Some(model.into());
        self
    }

    pub fn vision_timeout(mut self, duration: Duration) -> Self {
        self.vision_timeout = Some(duration);
        self
    }

    pub fn structuring_timeout(mut self, duration: Duration) -> Self {
        self.structuring_timeout = Some(duration);
        self
    }

    /// Set the end-to-end deadline for one analysis
    pub fn pipeline_timeout(mut self, duration: Duration) -> Self {
        self.pipeline_timeout = Some(duration);
        self
    }

    pub fn http_referer(mut self, referer: impl Into<String>) -> Self {
        self.http_referer = Some(referer.into());
        self
    }

    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = Some(title.into());
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    /// Returns `AnalysisError::BuilderError` if no API key is available or
    /// either model is missing.
    pub fn build(self) -> Result<AnalysisPipeline, AnalysisError> {
        // Try the builder first, then fall back to environment variable
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AnalysisError::BuilderError(
                    "OPENROUTER_API_KEY not found in config or environment".to_string(),
                )
            })?;
        let vision_model = required(self.vision_model, "vision model")?;
        let structuring_model = required(self.structuring_model, "structuring model")?;

        let provider: Arc<dyn ChatProvider> = Arc::new(
            OpenRouterProvider::new(api_key, self.base_url)
                .with_attribution(self.http_referer, self.app_title),
        );

        let vision = VisionService::new(Arc::clone(&provider), vision_model)
            .with_timeout(self.vision_timeout.unwrap_or(DEFAULT_VISION_TIMEOUT));
        let nutrition = NutritionService::new(provider, structuring_model)
            .with_timeout(self.structuring_timeout.unwrap_or(DEFAULT_STRUCTURING_TIMEOUT));

        Ok(AnalysisPipeline::new(Arc::new(vision), Arc::new(nutrition))
            .with_deadline(self.pipeline_timeout.unwrap_or(DEFAULT_PIPELINE_TIMEOUT)))
    }
}

fn required(value: Option<String>, what: &str) -> Result<String, AnalysisError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AnalysisError::BuilderError(format!("No {} specified", what)))
}

/// Main entry point for the builder API
pub struct FoodAnalyzer;

impl FoodAnalyzer {
    /// Creates a new builder for the analysis pipeline
    ///
    /// # Example
    /// ```
    /// use nutrition_vision::FoodAnalyzer;
    ///
    /// let builder = FoodAnalyzer::builder();
    /// ```
    pub fn builder() -> FoodAnalyzerBuilder {
        FoodAnalyzerBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_explicit_settings() {
        let pipeline = FoodAnalyzer::builder()
            .api_key("sk-test")
            .vision_model("openai/gpt-4o")
            .structuring_model("openai/gpt-4o-mini")
            .pipeline_timeout(Duration::from_secs(90))
            .build()
            .unwrap();

        assert_eq!(pipeline.deadline(), Duration::from_secs(90));
    }

    #[test]
    fn test_build_defaults_pipeline_deadline() {
        let pipeline = FoodAnalyzer::builder()
            .api_key("sk-test")
            .vision_model("openai/gpt-4o")
            .structuring_model("openai/gpt-4o-mini")
            .build()
            .unwrap();

        assert_eq!(pipeline.deadline(), Duration::from_secs(120));
    }

    #[test]
    fn test_build_requires_models() {
        let result = FoodAnalyzer::builder()
            .api_key("sk-test")
            .vision_model("openai/gpt-4o")
            .build();

        match result {
            Err(AnalysisError::BuilderError(msg)) => assert!(msg.contains("structuring model")),
            _ => panic!("Expected builder error"),
        }
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let result = FoodAnalyzer::builder()
            .api_key("   ")
            .vision_model("openai/gpt-4o")
            .structuring_model("openai/gpt-4o-mini")
            .build();

        assert!(matches!(result, Err(AnalysisError::BuilderError(_))));
    }
}
