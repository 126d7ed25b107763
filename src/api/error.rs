use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{
    AuthError, CatalogError, RecipeError, ShoppingListError, ShortLinkError, UserError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<ShortLinkError> for ApiError {
    fn from(err: ShortLinkError) -> Self {
        match err {
            ShortLinkError::RecipeNotFound(id) => ApiError::not_found("Recipe", id),
            ShortLinkError::LinkNotFound => ApiError::NotFound("Short link not found".to_string()),
            ShortLinkError::Exhausted(_) => ApiError::Conflict(err.to_string()),
            ShortLinkError::Database(msg) => ApiError::DatabaseError(msg),
            ShortLinkError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<ShoppingListError> for ApiError {
    fn from(err: ShoppingListError) -> Self {
        match err {
            ShoppingListError::Database(msg) => ApiError::DatabaseError(msg),
            ShoppingListError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(id) => ApiError::not_found("Recipe", id),
            RecipeError::Forbidden => ApiError::Forbidden(err.to_string()),
            RecipeError::Validation(msg) => ApiError::ValidationError(msg),
            RecipeError::NotInCollection(_) => ApiError::NotFound(err.to_string()),
            RecipeError::Database(msg) => ApiError::DatabaseError(msg),
            RecipeError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => ApiError::not_found("User", id),
            UserError::Validation(msg) => ApiError::ValidationError(msg),
            UserError::Database(msg) => ApiError::DatabaseError(msg),
            UserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::TagNotFound(id) => ApiError::not_found("Tag", id),
            CatalogError::IngredientNotFound(id) => ApiError::not_found("Ingredient", id),
            CatalogError::InvalidFile(msg) => ApiError::ValidationError(msg),
            CatalogError::Database(msg) => ApiError::DatabaseError(msg),
            CatalogError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::ValidationError(err.to_string()),
            AuthError::UserNotFound => ApiError::Unauthorized(err.to_string()),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication credentials were not provided".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_short_link_error_statuses() {
        assert_eq!(status(ShortLinkError::RecipeNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status(ShortLinkError::LinkNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ShortLinkError::Exhausted(5)), StatusCode::CONFLICT);
        assert_eq!(
            status(ShortLinkError::Database("locked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_recipe_collection_statuses() {
        assert_eq!(
            status(RecipeError::NotInCollection("favorites")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(RecipeError::Forbidden), StatusCode::FORBIDDEN);
    }
}
