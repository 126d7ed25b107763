use sea_orm::FromQueryResult;

/// Bounds shared by cooking time and ingredient amounts.
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 32_000;

pub const MAX_RECIPE_NAME_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: String,
}

impl From<crate::entities::recipes::Model> for Recipe {
    fn from(model: crate::entities::recipes::Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            name: model.name,
            image: model.image,
            text: model.text,
            cooking_time: model.cooking_time,
            created_at: model.created_at,
        }
    }
}

/// An ingredient line of a recipe, joined with the ingredient it refers to.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct IngredientLine {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Validated recipe contents ready to be written.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    /// `None` keeps the current image on update
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    /// `(ingredient_id, amount)`
    pub ingredients: Vec<(i32, i32)>,
}

/// Narrowing applied to recipe listings. Empty `tags` means no tag filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    pub tags: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_size: u64, max_size: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: limit.unwrap_or(default_size).clamp(1, max_size),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page * self.per_page < self.total
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::new(None, None, 6, 100),
            PageRequest {
                page: 1,
                per_page: 6
            }
        );
        assert_eq!(PageRequest::new(Some(0), Some(0), 6, 100).page, 1);
        assert_eq!(PageRequest::new(Some(0), Some(0), 6, 100).per_page, 1);
        assert_eq!(PageRequest::new(Some(3), Some(500), 6, 100).per_page, 100);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page {
            items: vec![1, 2],
            total: 8,
            page: 1,
            per_page: 6,
        };
        assert!(page.has_next());
        assert!(!page.has_previous());

        let last = Page {
            items: vec![7, 8],
            total: 8,
            page: 2,
            per_page: 6,
        };
        assert!(!last.has_next());
        assert!(last.has_previous());
    }
}
