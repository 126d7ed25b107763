use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::entities::{ingredients, tags};
use crate::models::recipe::{IngredientLine, Page};
use crate::services::image::media_url;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Paginated list envelope. `next`/`previous` are page numbers.
#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub count: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> From<Page<T>> for PageDto<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            count: page.total,
            next: page.has_next().then_some(page.page + 1),
            previous: page.has_previous().then_some(page.page - 1),
            results: page.items,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserDto {
    #[must_use]
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
            avatar: user.avatar.as_deref().map(media_url),
        }
    }
}

/// Returned by registration; never carries credentials.
#[derive(Debug, Serialize)]
pub struct CreatedUserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvatarDto {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<ShortRecipeDto>,
    pub recipes_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TagDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<tags::Model> for TagDto {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredients::Model> for IngredientDto {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            measurement_unit: model.measurement_unit,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<IngredientLine> for RecipeIngredientDto {
    fn from(line: IngredientLine) -> Self {
        Self {
            id: line.ingredient_id,
            name: line.name,
            measurement_unit: line.measurement_unit,
            amount: line.amount,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct RecipeDto {
    pub id: i32,
    pub author: UserDto,
    pub name: String,
    pub image: String,
    pub text: String,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub tags: Vec<TagDto>,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct ShortRecipeDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<crate::models::recipe::Recipe> for ShortRecipeDto {
    fn from(recipe: crate::models::recipe::Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShortLinkDto {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_dto_uses_hyphenated_key() {
        let dto = ShortLinkDto {
            short_link: "http://localhost:6789/s/AbCdEfG".to_string(),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["short-link"], "http://localhost:6789/s/AbCdEfG");
    }

    #[test]
    fn test_page_dto_navigation() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 9,
            page: 2,
            per_page: 3,
        };
        let dto = PageDto::from(page);
        assert_eq!(dto.count, 9);
        assert_eq!(dto.next, Some(3));
        assert_eq!(dto.previous, Some(1));
    }
}
