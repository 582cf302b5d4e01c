//! Shape checks for the inbound request and the structured model output.
//!
//! Both directions work on loose `serde_json::Value`s so that a failure can
//! name the offending field. Unknown fields are ignored everywhere.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::AnalysisError;
use crate::model::{
    default_unit, AnalysisRequest, CaloriesInfo, FoodItem, Macronutrients, NutritionAnalysis,
};

const MISSING: &str = "Missing data for required field.";

/// Validate the raw request body and extract the image URL
pub fn validate_request(raw: &Value) -> Result<AnalysisRequest, AnalysisError> {
    let body = raw
        .as_object()
        .ok_or_else(|| AnalysisError::Validation("Request body must be a JSON object.".into()))?;

    let image_url = match body.get("image_url") {
        None | Some(Value::Null) => return Err(field_error("image_url", MISSING)),
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(field_error("image_url", "Not a valid URL.")),
    };

    if image_url.is_empty() {
        return Err(field_error("image_url", "Not a valid URL."));
    }

    // Relative paths fail to parse; scheme-only URLs like `mailto:x` parse but have no host
    match Url::parse(image_url) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(AnalysisRequest {
            image_url: image_url.to_string(),
        }),
        _ => Err(field_error("image_url", "Not a valid URL.")),
    }
}

/// Validate and coerce the structuring model's JSON into a `NutritionAnalysis`
pub fn validate_response(raw: Value) -> Result<NutritionAnalysis, AnalysisError> {
    let root = raw.as_object().ok_or_else(|| {
        AnalysisError::Validation("Nutrition analysis must be a JSON object.".into())
    })?;

    let calories = object_field(root, "calories", "calories")?;
    let total = non_negative_int(calories.get("total"), "calories.total")?;
    let unit = match calories.get("unit") {
        None | Some(Value::Null) => default_unit(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(field_error("calories.unit", "Not a valid string.")),
    };

    let macros = object_field(root, "macronutrients", "macronutrients")?;
    let macronutrients = Macronutrients {
        protein: text(macros.get("protein"), "macronutrients.protein")?,
        carbs: text(macros.get("carbs"), "macronutrients.carbs")?,
        fats: text(macros.get("fats"), "macronutrients.fats")?,
        fiber: text(macros.get("fiber"), "macronutrients.fiber")?,
    };

    let items = match root.get("items") {
        None | Some(Value::Null) => return Err(field_error("items", MISSING)),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| food_item(entry, i))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(field_error("items", "Not a valid list.")),
    };

    Ok(NutritionAnalysis {
        calories: CaloriesInfo { total, unit },
        macronutrients,
        items,
    })
}

fn food_item(entry: &Value, index: usize) -> Result<FoodItem, AnalysisError> {
    let path = format!("items[{}]", index);
    let item = entry
        .as_object()
        .ok_or_else(|| field_error(&path, "Invalid input type."))?;

    Ok(FoodItem {
        name: text(item.get("name"), &format!("{}.name", path))?,
        quantity: text(item.get("quantity"), &format!("{}.quantity", path))?,
    })
}

fn object_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, AnalysisError> {
    match parent.get(key) {
        None | Some(Value::Null) => Err(field_error(path, MISSING)),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(field_error(path, "Invalid input type.")),
    }
}

/// Strings pass through; numbers are coerced to their decimal text
fn text(value: Option<&Value>, path: &str) -> Result<String, AnalysisError> {
    match value {
        None | Some(Value::Null) => Err(field_error(path, MISSING)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(field_error(path, "Not a valid string.")),
    }
}

/// Accepts integers, integral floats and integer strings
fn non_negative_int(value: Option<&Value>, path: &str) -> Result<u32, AnalysisError> {
    let invalid = || field_error(path, "Not a valid non-negative integer.");

    match value {
        None | Some(Value::Null) => Err(field_error(path, MISSING)),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).map_err(|_| invalid())
            } else {
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
                        Ok(f as u32)
                    }
                    _ => Err(invalid()),
                }
            }
        }
        Some(Value::String(s)) => s.trim().parse::<u32>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn field_error(path: &str, message: &str) -> AnalysisError {
    AnalysisError::Validation(format!("{}: {}", path, message))
}
