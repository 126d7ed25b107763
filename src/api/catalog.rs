use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, IngredientDto, TagDto};

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

/// GET /tags
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TagDto>>, ApiError> {
    Ok(Json(state.catalog_service().list_tags().await?))
}

/// GET /tags/{id}
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TagDto>, ApiError> {
    Ok(Json(state.catalog_service().get_tag(id).await?))
}

/// GET /ingredients?name=<prefix>
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<IngredientDto>>, ApiError> {
    let ingredients = state
        .catalog_service()
        .list_ingredients(query.name.as_deref())
        .await?;

    Ok(Json(ingredients))
}

/// GET /ingredients/{id}
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientDto>, ApiError> {
    Ok(Json(state.catalog_service().get_ingredient(id).await?))
}
