//! Input validation helpers
//!
//! Only the JSON type of each field is checked. Any string is a title (empty
//! included) and any list of `{name, color, parts}` objects is a recipe.

use serde_json::Value;
use shared::{Ingredient, parse_recipe};

use crate::utils::AppError;

/// A title must be a JSON string
pub fn parse_title(value: Value) -> Result<String, AppError> {
    match value {
        Value::String(title) => Ok(title),
        other => Err(AppError::unprocessable(format!(
            "title must be a string, got {other}"
        ))),
    }
}

/// A recipe must be a list of `{name, color, parts}` objects
///
/// An empty list is accepted.
pub fn parse_recipe_value(value: Value) -> Result<Vec<Ingredient>, AppError> {
    parse_recipe(value).map_err(AppError::unprocessable)
}
