use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Process configuration, loaded once at start-up
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// OpenRouter API key (can also be set via OPENROUTER_API_KEY)
    pub openrouter_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier for the vision stage (e.g., "openai/gpt-4o")
    pub vision_model: String,
    /// Model identifier for the structuring stage
    pub structuring_model: String,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Vision call timeout in seconds
    #[serde(default = "default_vision_timeout")]
    pub vision_timeout: u64,
    /// Structuring call timeout in seconds
    #[serde(default = "default_structuring_timeout")]
    pub structuring_timeout: u64,
    /// End-to-end pipeline deadline in seconds
    #[serde(default = "default_pipeline_timeout")]
    pub pipeline_timeout: u64,
    /// Sent as HTTP-Referer to OpenRouter
    pub http_referer: Option<String>,
    /// Sent as X-Title to OpenRouter
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

// Default value functions
fn default_base_url() -> String {
    crate::providers::DEFAULT_BASE_URL.to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_vision_timeout() -> u64 {
    30
}

fn default_structuring_timeout() -> u64 {
    60
}

fn default_pipeline_timeout() -> u64 {
    120
}

fn default_app_title() -> String {
    "NutritionVision".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with NUTRITION_ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: NUTRITION_VISION_MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn vision_timeout(&self) -> Duration {
        Duration::from_secs(self.vision_timeout)
    }

    pub fn structuring_timeout(&self) -> Duration {
        Duration::from_secs(self.structuring_timeout)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout)
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the lookup order.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::with_prefix("NUTRITION").try_parsing(true))
        .build()?;

    settings.try_deserialize()
}
