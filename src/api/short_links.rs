use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState, ShortLinkDto};

/// GET /recipes/{id}/get-link/
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ShortLinkDto>, ApiError> {
    let short_link = state.short_link_service().get_or_create(id).await?;
    Ok(Json(ShortLinkDto { short_link }))
}

/// GET /s/{token}/
/// 302 Found to the client-side recipe page
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state.short_link_service().resolve(&token).await?;
    metrics::counter!("foodgram_short_link_redirects_total").increment(1);
    Ok((StatusCode::FOUND, [(header::LOCATION, path)]))
}
