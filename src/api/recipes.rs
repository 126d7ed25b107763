use axum::{
    Extension, Json,
    extract::{Path, RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState, PageDto, RecipeDto};
use crate::db::Collection;
use crate::models::recipe::RecipeFilter;
use crate::services::RecipePayload;

const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// Parsed `GET /recipes` query string.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub filter: RecipeFilter,
}

fn flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation(format!("{key} must be a number")))
}

/// `tags` may repeat; `is_favorited` and `is_in_shopping_cart` only apply
/// to an authenticated viewer.
pub fn parse_list_query(raw: Option<&str>, viewer: Option<i32>) -> Result<ListQuery, ApiError> {
    let mut query = ListQuery::default();

    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "page" => query.page = Some(number("page", &value)?),
            "limit" => query.limit = Some(number("limit", &value)?),
            "author" => query.filter.author_id = Some(number("author", &value)?),
            "tags" => {
                if !value.is_empty() {
                    query.filter.tags.push(value.into_owned());
                }
            }
            "is_favorited" if flag(&value) => query.filter.favorited_by = viewer,
            "is_in_shopping_cart" if flag(&value) => query.filter.in_cart_of = viewer,
            _ => {}
        }
    }

    Ok(query)
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<CurrentUser>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageDto<RecipeDto>>, ApiError> {
    let viewer = viewer.map(|Extension(u)| u.id);
    let query = parse_list_query(raw.as_deref(), viewer)?;
    let page = state.page_request(query.page, query.limit).await;

    let recipes = state
        .recipe_service()
        .list(query.filter, page, viewer)
        .await?;

    Ok(Json(recipes.into()))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDto>, ApiError> {
    let recipe = state
        .recipe_service()
        .get(id, viewer.map(|Extension(u)| u.id))
        .await?;

    Ok(Json(recipe))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDto>), ApiError> {
    let recipe = state.recipe_service().create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PATCH /recipes/{id}
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeDto>, ApiError> {
    let recipe = state.recipe_service().update(id, user.id, payload).await?;
    Ok(Json(recipe))
}

/// DELETE /recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.recipe_service().delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 201 with the short form on first add, 204 when the recipe was already there.
async fn add_to(
    state: &AppState,
    collection: Collection,
    user: &CurrentUser,
    recipe_id: i32,
) -> Result<Response, ApiError> {
    let added = state
        .recipe_service()
        .add_to(collection, user.id, recipe_id)
        .await?;

    Ok(match added {
        Some(recipe) => (StatusCode::CREATED, Json(recipe)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn remove_from(
    state: &AppState,
    collection: Collection,
    user: &CurrentUser,
    recipe_id: i32,
) -> Result<StatusCode, ApiError> {
    state
        .recipe_service()
        .remove_from(collection, user.id, recipe_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    add_to(&state, Collection::Favorites, &user, id).await
}

/// DELETE /recipes/{id}/favorite
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from(&state, Collection::Favorites, &user, id).await
}

/// POST /recipes/{id}/shopping_cart
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    add_to(&state, Collection::ShoppingCart, &user, id).await
}

/// DELETE /recipes/{id}/shopping_cart
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from(&state, Collection::ShoppingCart, &user, id).await
}

/// GET /recipes/download_shopping_cart/
/// Plain-text shopping list for the caller's cart, served as an attachment
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state.shopping_list_service().build(user.id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        list.render(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_tags_and_paging() {
        let query = parse_list_query(Some("tags=breakfast&tags=lunch&page=2&limit=3"), None).unwrap();
        assert_eq!(query.filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_flags_need_a_viewer() {
        let anonymous =
            parse_list_query(Some("is_favorited=1&is_in_shopping_cart=1"), None).unwrap();
        assert_eq!(anonymous.filter.favorited_by, None);
        assert_eq!(anonymous.filter.in_cart_of, None);

        let viewer = parse_list_query(Some("is_favorited=1&is_in_shopping_cart=0"), Some(7)).unwrap();
        assert_eq!(viewer.filter.favorited_by, Some(7));
        assert_eq!(viewer.filter.in_cart_of, None);
    }

    #[test]
    fn test_rejects_non_numeric_author() {
        assert!(parse_list_query(Some("author=bob"), None).is_err());
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(parse_list_query(None, None).unwrap(), ListQuery::default());
    }
}
