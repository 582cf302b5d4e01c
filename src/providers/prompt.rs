/// System prompt for the vision stage.
///
/// Asks for an itemized breakdown with metric quantities, calorie and
/// macronutrient estimates, cuisine inference and explicit handling of
/// occluded or low quality photos. Loaded from `vision_prompt.txt` at
/// compile time so it can be edited without dealing with Rust string syntax.
pub const VISION_ANALYSIS_PROMPT: &str = include_str!("vision_prompt.txt");

/// Text sent alongside the image in the user turn
pub const VISION_USER_INSTRUCTION: &str =
    "Describe this dish in detail and estimate its nutrition.";

/// System prompt for the structuring stage, demanding bare JSON in the
/// `NutritionAnalysis` shape.
pub const NUTRITION_STRUCTURING_PROMPT: &str = include_str!("structuring_prompt.txt");
