use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState, AvatarDto, CreatedUserDto, PageDto, SubscriptionDto, UserDto};
use crate::services::RegisterRequest;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub recipes_limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<CurrentUser>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageDto<UserDto>>, ApiError> {
    let page = state.page_request(query.page, query.limit).await;
    let users = state
        .user_service()
        .list(page, viewer.map(|Extension(u)| u.id))
        .await?;

    Ok(Json(users.into()))
}

/// POST /users
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedUserDto>), ApiError> {
    let user = state.user_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .user_service()
        .get(id, viewer.map(|Extension(u)| u.id))
        .await?;

    Ok(Json(user))
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserDto>, ApiError> {
    let me = state.user_service().get(user.id, Some(user.id)).await?;
    Ok(Json(me))
}

/// PUT /users/me/avatar
pub async fn set_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AvatarRequest>,
) -> Result<Json<AvatarDto>, ApiError> {
    let data = payload
        .avatar
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::validation("avatar is required"))?;

    let avatar = state.user_service().set_avatar(user.id, &data).await?;
    Ok(Json(avatar))
}

/// DELETE /users/me/avatar
pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service().delete_avatar(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/set_password
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service()
        .set_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<Json<PageDto<SubscriptionDto>>, ApiError> {
    let page = state.page_request(query.page, query.limit).await;
    let authors = state
        .user_service()
        .subscriptions(user.id, page, query.recipes_limit)
        .await?;

    Ok(Json(authors.into()))
}

/// POST /users/{id}/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(author_id): Path<i32>,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionDto>), ApiError> {
    let subscription = state
        .user_service()
        .subscribe(user.id, author_id, query.recipes_limit)
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /users/{id}/subscribe
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(author_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service().unsubscribe(user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
