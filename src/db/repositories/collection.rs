//! Per-user recipe collections: favorites and the shopping cart.
//!
//! Both are `(user, recipe)` sets with a composite primary key, so adding the
//! same recipe twice is a no-op at the store level.

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{OnConflict, Query},
};
use std::collections::HashSet;

use crate::entities::{favorites, ingredients, prelude::*, recipe_ingredients, shopping_cart};
use crate::models::shopping_list::CartLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Favorites,
    ShoppingCart,
}

impl Collection {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

pub struct CollectionRepository {
    conn: DatabaseConnection,
}

impl CollectionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns `false` when the recipe was already in the collection.
    pub async fn add(&self, collection: Collection, user_id: i32, recipe_id: i32) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let inserted = match collection {
            Collection::Favorites => {
                Favorites::insert(favorites::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    created_at: Set(now),
                })
                .on_conflict(
                    OnConflict::columns([favorites::Column::UserId, favorites::Column::RecipeId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
            }
            Collection::ShoppingCart => {
                ShoppingCart::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    created_at: Set(now),
                })
                .on_conflict(
                    OnConflict::columns([
                        shopping_cart::Column::UserId,
                        shopping_cart::Column::RecipeId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
            }
        }
        .with_context(|| format!("Failed to add recipe {recipe_id} to {}", collection.label()))?;

        Ok(inserted > 0)
    }

    /// Returns `false` when the recipe was not in the collection.
    pub async fn remove(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        let result = match collection {
            Collection::Favorites => {
                Favorites::delete_by_id((user_id, recipe_id))
                    .exec(&self.conn)
                    .await
            }
            Collection::ShoppingCart => {
                ShoppingCart::delete_by_id((user_id, recipe_id))
                    .exec(&self.conn)
                    .await
            }
        }
        .with_context(|| {
            format!(
                "Failed to remove recipe {recipe_id} from {}",
                collection.label()
            )
        })?;

        Ok(result.rows_affected > 0)
    }

    /// Which of `recipe_ids` are in the user's collection.
    pub async fn contained_among(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = match collection {
            Collection::Favorites => {
                Favorites::find()
                    .select_only()
                    .column(favorites::Column::RecipeId)
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .into_tuple()
                    .all(&self.conn)
                    .await?
            }
            Collection::ShoppingCart => {
                ShoppingCart::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .into_tuple()
                    .all(&self.conn)
                    .await?
            }
        };

        Ok(ids.into_iter().collect())
    }

    /// Every ingredient line of every recipe in the user's cart, unaggregated.
    pub async fn cart_lines(&self, user_id: i32) -> Result<Vec<CartLine>> {
        let cart_recipes = Query::select()
            .column(shopping_cart::Column::RecipeId)
            .from(ShoppingCart)
            .and_where(shopping_cart::Column::UserId.eq(user_id))
            .to_owned();

        let lines = RecipeIngredients::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount, "amount")
            .inner_join(Ingredients)
            .filter(recipe_ingredients::Column::RecipeId.in_subquery(cart_recipes))
            .order_by_asc(ingredients::Column::Name)
            .into_model::<CartLine>()
            .all(&self.conn)
            .await
            .context("Failed to load shopping cart ingredient lines")?;

        Ok(lines)
    }
}
