use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated request to analyze one food image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub image_url: String,
}

/// Free-text meal description produced by the vision model.
///
/// Opaque: nothing inside it is validated, it is only handed to the
/// structuring stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodDescription(String);

impl FoodDescription {
    pub fn new(text: impl Into<String>) -> Self {
        FoodDescription(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FoodDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaloriesInfo {
    pub total: u32,
    #[serde(default = "default_unit")]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macronutrients {
    pub protein: String,
    pub carbs: String,
    pub fats: String,
    pub fiber: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub quantity: String,
}

/// The structured result returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionAnalysis {
    pub calories: CaloriesInfo,
    pub macronutrients: Macronutrients,
    pub items: Vec<FoodItem>,
}

/// Body returned for every failed analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub(crate) fn default_unit() -> String {
    "kcal".to_string()
}
