//! Drinks API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use serde_json::{Map, Value};
use shared::{DeletedResponse, Drink, DrinkLong, DrinkShort, DrinksResponse, Ingredient, NewDrink};

use crate::api::extract::{DrinkId, JsonBody};
use crate::auth::ClaimSet;
use crate::core::ServerState;
use crate::db::RepoError;
use crate::utils::validation::{parse_recipe_value, parse_title};
use crate::utils::{AppError, AppResult};

/// GET /drinks - public menu, ingredient names withheld
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<DrinksResponse<DrinkShort>>> {
    let drinks = state.store.list_all().await?;
    let items = drinks.iter().map(Drink::short).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(DrinksResponse::ok(items)))
}

/// GET /drinks-detail - full recipes
pub async fn detail(
    State(state): State<ServerState>,
    Extension(claims): Extension<ClaimSet>,
) -> AppResult<Json<DrinksResponse<DrinkLong>>> {
    let drinks = state.store.list_all().await?;
    let items = drinks.iter().map(Drink::long).collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(subject = %claims.subject(), count = items.len(), "Drink detail listed");
    Ok(Json(DrinksResponse::ok(items)))
}

/// POST /drinks - add a drink
///
/// Body: `{"title": "...", "recipe": [{"name", "color", "parts"}]}`, both keys
/// required.
pub async fn create(
    State(state): State<ServerState>,
    Extension(claims): Extension<ClaimSet>,
    JsonBody(mut body): JsonBody,
) -> AppResult<Json<DrinksResponse<DrinkLong>>> {
    let (Some(title), Some(recipe)) = (body.remove("title"), body.remove("recipe")) else {
        return Err(AppError::bad_request("create needs both title and recipe"));
    };

    let title = parse_title(title)?;
    let recipe = parse_recipe_value(recipe)?;
    let new = NewDrink::new(title, &recipe)?;

    let drink = state.store.insert(new).await.map_err(persist_error)?;

    tracing::info!(subject = %claims.subject(), drink_id = drink.id, title = %drink.title, "Drink created");
    Ok(Json(DrinksResponse::ok(vec![drink.long()?])))
}

/// PATCH /drinks/{id} - change title and/or recipe
///
/// Absent fields keep their stored value untouched.
pub async fn update(
    State(state): State<ServerState>,
    Extension(claims): Extension<ClaimSet>,
    DrinkId(id): DrinkId,
    JsonBody(body): JsonBody,
) -> AppResult<Json<DrinksResponse<DrinkLong>>> {
    let changes = DrinkChanges::from_body(body)?;

    let mut drink = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("drink {id}")))?;

    if let Some(title) = changes.title {
        drink.title = title;
    }
    if let Some(recipe) = changes.recipe {
        drink.set_recipe(&recipe)?;
    }

    state.store.update(&drink).await.map_err(persist_error)?;

    tracing::info!(subject = %claims.subject(), drink_id = id, "Drink updated");
    Ok(Json(DrinksResponse::ok(vec![drink.long()?])))
}

/// DELETE /drinks/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(claims): Extension<ClaimSet>,
    DrinkId(id): DrinkId,
) -> AppResult<Json<DeletedResponse>> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("drink {id}")))?;

    state.store.delete(id).await.map_err(persist_error)?;

    tracing::info!(subject = %claims.subject(), drink_id = id, "Drink deleted");
    Ok(Json(DeletedResponse::ok(id)))
}

/// Validated partial update
#[derive(Debug)]
struct DrinkChanges {
    title: Option<String>,
    recipe: Option<Vec<Ingredient>>,
}

impl DrinkChanges {
    fn from_body(mut body: Map<String, Value>) -> AppResult<Self> {
        let title = body.remove("title");
        let recipe = body.remove("recipe");
        if title.is_none() && recipe.is_none() {
            return Err(AppError::bad_request("update needs title or recipe"));
        }

        let title = title.map(parse_title).transpose()?;
        let recipe = recipe.map(parse_recipe_value).transpose()?;
        Ok(Self { title, recipe })
    }
}

/// Failed writes are 422 unless the row is gone
fn persist_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(msg) => AppError::NotFound(msg),
        other => AppError::persist_failed(other),
    }
}
