//! Turn a food photo into a structured nutrition estimate.
//!
//! A vision model describes the meal, a second model reshapes the description
//! into a fixed JSON schema, and the result is validated before it is
//! returned. Every failure comes back as a typed [`AnalysisError`].
//!
//! # Example
//! ```no_run
//! use nutrition_vision::FoodAnalyzer;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = FoodAnalyzer::builder()
//!     .api_key("sk-or-...")
//!     .vision_model("openai/gpt-4o")
//!     .structuring_model("openai/gpt-4o-mini")
//!     .build()?;
//!
//! let analysis = pipeline
//!     .run(json!({"image_url": "https://example.com/lunch.jpg"}))
//!     .await?;
//! println!("{} {}", analysis.calories.total, analysis.calories.unit);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod model;
pub mod nutrition;
pub mod pipelines;
pub mod providers;
pub mod server;
pub mod validation;
pub mod vision;

pub use builder::{FoodAnalyzer, FoodAnalyzerBuilder};
pub use crate::config::{load_config, AppConfig};
pub use error::{AnalysisError, FailureKind};
pub use model::{
    AnalysisRequest, CaloriesInfo, ErrorResponse, FoodDescription, FoodItem, Macronutrients,
    NutritionAnalysis,
};
pub use nutrition::{NutritionService, NutritionStructurer};
pub use pipelines::{AnalysisPipeline, Stage};
pub use validation::{validate_request, validate_response};
pub use vision::{FoodVision, VisionService};

/// Analyze one image using configuration from `config.toml` and the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let analysis = nutrition_vision::analyze_food_image("https://example.com/lunch.jpg").await?;
/// println!("{} kcal", analysis.calories.total);
/// # Ok(())
/// # }
/// ```
pub async fn analyze_food_image(image_url: &str) -> Result<NutritionAnalysis, AnalysisError> {
    let config = load_config()?;
    let pipeline = FoodAnalyzer::builder().from_config(&config).build()?;

    pipeline
        .run(serde_json::json!({ "image_url": image_url }))
        .await
}
