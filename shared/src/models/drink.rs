//! Drink Model

use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;

/// One line of a recipe
///
/// `parts` is any JSON number and is stored exactly as received, so `1`
/// stays `1` and `1.5` stays `1.5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: Number,
}

/// Ingredient as shown on the public menu (name withheld)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientShort {
    pub color: String,
    pub parts: Number,
}

impl From<&Ingredient> for IngredientShort {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            color: ingredient.color.clone(),
            parts: ingredient.parts.clone(),
        }
    }
}

/// Recipe encode/decode failure
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe must be a list of {{name, color, parts}} entries: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Drink entity
///
/// `recipe` holds the serialized ingredient list exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: String,
}

/// Create drink payload (id is assigned by the store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: String,
}

impl NewDrink {
    pub fn new(title: impl Into<String>, recipe: &[Ingredient]) -> Result<Self, RecipeError> {
        Ok(Self {
            title: title.into(),
            recipe: encode_recipe(recipe)?,
        })
    }
}

/// Public menu view of a drink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientShort>,
}

/// Full view of a drink, ingredient names included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// Decode the stored recipe
    pub fn ingredients(&self) -> Result<Vec<Ingredient>, RecipeError> {
        Ok(serde_json::from_str(&self.recipe)?)
    }

    /// Replace the stored recipe
    pub fn set_recipe(&mut self, recipe: &[Ingredient]) -> Result<(), RecipeError> {
        self.recipe = encode_recipe(recipe)?;
        Ok(())
    }

    pub fn short(&self) -> Result<DrinkShort, RecipeError> {
        let recipe = self.ingredients()?.iter().map(IngredientShort::from).collect();
        Ok(DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe,
        })
    }

    pub fn long(&self) -> Result<DrinkLong, RecipeError> {
        Ok(DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: self.ingredients()?,
        })
    }
}

/// Interpret an arbitrary JSON value as a recipe
pub fn parse_recipe(value: serde_json::Value) -> Result<Vec<Ingredient>, RecipeError> {
    Ok(serde_json::from_value(value)?)
}

pub fn encode_recipe(recipe: &[Ingredient]) -> Result<String, RecipeError> {
    Ok(serde_json::to_string(recipe)?)
}
