//! Shared types for the drinks menu service
//!
//! Wire models used by the server and by any client talking to it:
//! the drink record and its projections, and the JSON response envelopes.

pub mod models;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Drink, DrinkLong, DrinkShort, Ingredient, IngredientShort, NewDrink, RecipeError, encode_recipe,
    parse_recipe,
};
pub use response::{DeletedResponse, DrinksResponse, ErrorBody};
