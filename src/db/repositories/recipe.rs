use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use std::collections::HashMap;
use tracing::info;

use crate::entities::{
    favorites, ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, shopping_cart,
    tags,
};
use crate::models::recipe::{IngredientLine, Recipe, RecipeDraft, RecipeFilter};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Recipe>> {
        let row = Recipes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query recipe")?;

        Ok(row.map(Recipe::from))
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        let count = Recipes::find_by_id(id).count(&self.conn).await?;
        Ok(count > 0)
    }

    /// One page of recipes, newest first.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        let paginator = Recipes::find()
            .filter(Self::filter_condition(filter))
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id)
            .paginate(&self.conn, per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows.into_iter().map(Recipe::from).collect(), total))
    }

    fn filter_condition(filter: &RecipeFilter) -> Condition {
        let mut condition = Condition::all();

        if let Some(author_id) = filter.author_id {
            condition = condition.add(recipes::Column::AuthorId.eq(author_id));
        }

        if !filter.tags.is_empty() {
            let tagged = Query::select()
                .column((RecipeTags, recipe_tags::Column::RecipeId))
                .from(RecipeTags)
                .inner_join(
                    Tags,
                    Expr::col((Tags, tags::Column::Id))
                        .equals((RecipeTags, recipe_tags::Column::TagId)),
                )
                .and_where(Expr::col((Tags, tags::Column::Slug)).is_in(filter.tags.clone()))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(tagged));
        }

        if let Some(user_id) = filter.favorited_by {
            let favorited = Query::select()
                .column(favorites::Column::RecipeId)
                .from(Favorites)
                .and_where(favorites::Column::UserId.eq(user_id))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(favorited));
        }

        if let Some(user_id) = filter.in_cart_of {
            let in_cart = Query::select()
                .column(shopping_cart::Column::RecipeId)
                .from(ShoppingCart)
                .and_where(shopping_cart::Column::UserId.eq(user_id))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(in_cart));
        }

        condition
    }

    /// Latest recipes of one author, at most `limit` when given.
    pub async fn list_by_author(&self, author_id: i32, limit: Option<u64>) -> Result<Vec<Recipe>> {
        let rows = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    pub async fn count_by_author(&self, author_id: i32) -> Result<u64> {
        let count = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// Tags of each recipe, grouped by recipe id and ordered by tag name.
    pub async fn tags_for(&self, recipe_ids: &[i32]) -> Result<HashMap<i32, Vec<tags::Model>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeTags::find()
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Tags)
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to load recipe tags")?;

        let mut map: HashMap<i32, Vec<tags::Model>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                map.entry(link.recipe_id).or_default().push(tag);
            }
        }

        Ok(map)
    }

    /// Ingredient lines of each recipe, grouped by recipe id and ordered by
    /// ingredient name.
    pub async fn lines_for(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<IngredientLine>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Ingredients)
            .order_by_asc(ingredients::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to load recipe ingredients")?;

        let mut map: HashMap<i32, Vec<IngredientLine>> = HashMap::new();
        for (line, ingredient) in rows {
            if let Some(ingredient) = ingredient {
                map.entry(line.recipe_id).or_default().push(IngredientLine {
                    ingredient_id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: line.amount,
                });
            }
        }

        Ok(map)
    }

    /// Writes a recipe with its tag links and ingredient lines atomically.
    pub async fn create(&self, author_id: i32, draft: RecipeDraft) -> Result<i32> {
        let image = draft
            .image
            .ok_or_else(|| anyhow::anyhow!("Recipe image is required"))?;

        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            author_id: Set(author_id),
            name: Set(draft.name),
            image: Set(image),
            text: Set(draft.text),
            cooking_time: Set(draft.cooking_time),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        Self::insert_links(&txn, recipe.id, &draft.tag_ids, &draft.ingredients).await?;

        txn.commit().await?;

        info!(recipe_id = recipe.id, author_id, "Created recipe");
        Ok(recipe.id)
    }

    /// Replaces a recipe's fields, tags and ingredient lines atomically.
    pub async fn update(&self, id: i32, draft: RecipeDraft) -> Result<()> {
        let txn = self.conn.begin().await?;

        let existing = Recipes::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Recipe not found: {id}"))?;

        let mut active: recipes::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.text = Set(draft.text);
        active.cooking_time = Set(draft.cooking_time);
        if let Some(image) = draft.image {
            active.image = Set(image);
        }
        active.update(&txn).await?;

        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        Self::insert_links(&txn, id, &draft.tag_ids, &draft.ingredients).await?;

        txn.commit().await?;

        info!(recipe_id = id, "Updated recipe");
        Ok(())
    }

    async fn insert_links<C>(
        conn: &C,
        recipe_id: i32,
        tag_ids: &[i32],
        ingredients: &[(i32, i32)],
    ) -> Result<()>
    where
        C: sea_orm::ConnectionTrait,
    {
        if !tag_ids.is_empty() {
            RecipeTags::insert_many(tag_ids.iter().map(|&tag_id| recipe_tags::ActiveModel {
                recipe_id: Set(recipe_id),
                tag_id: Set(tag_id),
            }))
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe tags")?;
        }

        if !ingredients.is_empty() {
            RecipeIngredients::insert_many(ingredients.iter().map(|&(ingredient_id, amount)| {
                recipe_ingredients::ActiveModel {
                    recipe_id: Set(recipe_id),
                    ingredient_id: Set(ingredient_id),
                    amount: Set(amount),
                }
            }))
            .exec_without_returning(conn)
            .await
            .context("Failed to insert recipe ingredients")?;
        }

        Ok(())
    }

    /// Removes a recipe; lines, tag links, favorites and cart entries go with
    /// it through `ON DELETE CASCADE`.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Recipes::delete_by_id(id).exec(&self.conn).await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed recipe with ID: {}", id);
        }
        Ok(removed)
    }
}
