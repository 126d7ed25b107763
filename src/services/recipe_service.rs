//! Domain service for recipes, favorites and the shopping cart.
//!
//! Validation of incoming payloads lives here so the HTTP layer only parses
//! JSON; everything that needs the database (tag and ingredient existence,
//! authorship) is checked by the implementation.

use crate::api::types::{RecipeDto, ShortRecipeDto};
use crate::db::Collection;
use crate::models::recipe::{
    MAX_QUANTITY, MAX_RECIPE_NAME_LEN, MIN_QUANTITY, Page, PageRequest, RecipeFilter,
};
use crate::services::image::ImageError;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    NotFound(i32),

    #[error("Only the author can modify this recipe")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Recipe is not in {0}")]
    NotInCollection(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ImageError> for RecipeError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidDataUri(msg) => Self::Validation(format!("image: {msg}")),
            ImageError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i64,
}

/// Create/update request body. Every field is optional at the parsing level
/// so missing fields surface as validation errors instead of JSON errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// A payload that passed the checks not needing the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<(i32, i32)>,
}

fn quantity(field: &str, value: i64) -> Result<i32, RecipeError> {
    if !(i64::from(MIN_QUANTITY)..=i64::from(MAX_QUANTITY)).contains(&value) {
        return Err(RecipeError::Validation(format!(
            "{field} must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
        )));
    }
    i32::try_from(value).map_err(|_| RecipeError::Validation(format!("{field} is out of range")))
}

/// Checks a payload's shape. `require_image` is set on create.
pub fn validate_payload(
    payload: RecipePayload,
    require_image: bool,
) -> Result<ValidatedRecipe, RecipeError> {
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RecipeError::Validation("name is required".to_string()))?;
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(RecipeError::Validation(format!(
            "name must be at most {MAX_RECIPE_NAME_LEN} characters"
        )));
    }

    let text = payload
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RecipeError::Validation("text is required".to_string()))?;

    let cooking_time = quantity(
        "cooking_time",
        payload
            .cooking_time
            .ok_or_else(|| RecipeError::Validation("cooking_time is required".to_string()))?,
    )?;

    let image = payload.image.filter(|i| !i.trim().is_empty());
    if require_image && image.is_none() {
        return Err(RecipeError::Validation("image is required".to_string()));
    }

    let tag_ids = payload.tags.unwrap_or_default();
    if tag_ids.is_empty() {
        return Err(RecipeError::Validation(
            "at least one tag is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = tag_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(RecipeError::Validation(format!("duplicate tag: {dup}")));
    }

    let lines = payload.ingredients.unwrap_or_default();
    if lines.is_empty() {
        return Err(RecipeError::Validation(
            "at least one ingredient is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let mut ingredients = Vec::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.id) {
            return Err(RecipeError::Validation(format!(
                "duplicate ingredient: {}",
                line.id
            )));
        }
        ingredients.push((line.id, quantity("amount", line.amount)?));
    }

    Ok(ValidatedRecipe {
        name,
        image,
        text,
        cooking_time,
        tag_ids,
        ingredients,
    })
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// One page of recipes, newest first.
    async fn list(
        &self,
        filter: RecipeFilter,
        page: PageRequest,
        viewer: Option<i32>,
    ) -> Result<Page<RecipeDto>, RecipeError>;

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<RecipeDto, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for a malformed payload or unknown
    /// tags and ingredients.
    async fn create(&self, author_id: i32, payload: RecipePayload)
    -> Result<RecipeDto, RecipeError>;

    /// Replaces a recipe. Only its author may do this.
    async fn update(
        &self,
        id: i32,
        editor_id: i32,
        payload: RecipePayload,
    ) -> Result<RecipeDto, RecipeError>;

    async fn delete(&self, id: i32, editor_id: i32) -> Result<(), RecipeError>;

    /// Adds the recipe to the collection. Returns `None` when it was
    /// already there; nothing is written in that case.
    async fn add_to(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<Option<ShortRecipeDto>, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::NotInCollection`] when there is nothing to remove.
    async fn remove_from(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), RecipeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: Some("Pancakes".to_string()),
            image: Some("data:image/png;base64,AAAA".to_string()),
            text: Some("Mix and fry.".to_string()),
            cooking_time: Some(20),
            tags: Some(vec![1, 2]),
            ingredients: Some(vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 3 },
            ]),
        }
    }

    #[test]
    fn test_valid_payload() {
        let recipe = validate_payload(payload(), true).unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.ingredients, vec![(1, 200), (2, 3)]);
    }

    #[test]
    fn test_rejects_empty_tags_and_ingredients() {
        let mut p = payload();
        p.tags = Some(vec![]);
        assert!(matches!(validate_payload(p, true), Err(RecipeError::Validation(_))));

        let mut p = payload();
        p.ingredients = None;
        assert!(matches!(validate_payload(p, true), Err(RecipeError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut p = payload();
        p.tags = Some(vec![1, 1]);
        assert!(validate_payload(p, true).is_err());

        let mut p = payload();
        p.ingredients = Some(vec![
            IngredientAmount { id: 4, amount: 1 },
            IngredientAmount { id: 4, amount: 2 },
        ]);
        assert!(validate_payload(p, true).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        let mut p = payload();
        p.cooking_time = Some(0);
        assert!(validate_payload(p, true).is_err());

        let mut p = payload();
        p.cooking_time = Some(32_001);
        assert!(validate_payload(p, true).is_err());

        let mut p = payload();
        p.ingredients = Some(vec![IngredientAmount { id: 1, amount: 0 }]);
        assert!(validate_payload(p, true).is_err());

        let mut p = payload();
        p.cooking_time = Some(32_000);
        assert!(validate_payload(p, true).is_ok());
    }

    #[test]
    fn test_image_required_only_on_create() {
        let mut p = payload();
        p.image = None;
        assert!(validate_payload(p.clone(), true).is_err());
        assert!(validate_payload(p, false).is_ok());
    }

    #[test]
    fn test_rejects_blank_name_and_long_name() {
        let mut p = payload();
        p.name = Some("   ".to_string());
        assert!(validate_payload(p, true).is_err());

        let mut p = payload();
        p.name = Some("x".repeat(MAX_RECIPE_NAME_LEN + 1));
        assert!(validate_payload(p, true).is_err());
    }
}
