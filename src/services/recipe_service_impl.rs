//! `SeaORM` implementation of the `RecipeService` trait.

use crate::api::types::{RecipeDto, ShortRecipeDto, TagDto, UserDto};
use crate::db::{Collection, Store};
use crate::models::recipe::{Page, PageRequest, Recipe, RecipeDraft, RecipeFilter};
use crate::services::image::{ImageFolder, ImageService, media_url};
use crate::services::recipe_service::{
    RecipeError, RecipePayload, RecipeService, ValidatedRecipe, validate_payload,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub struct SeaOrmRecipeService {
    store: Store,
    images: ImageService,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: ImageService) -> Self {
        Self { store, images }
    }

    async fn check_references(&self, recipe: &ValidatedRecipe) -> Result<(), RecipeError> {
        let tags = self.store.get_tags_by_ids(&recipe.tag_ids).await?;
        if tags.len() != recipe.tag_ids.len() {
            let known: HashSet<i32> = tags.iter().map(|t| t.id).collect();
            let missing: Vec<String> = recipe
                .tag_ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(RecipeError::Validation(format!(
                "unknown tags: {}",
                missing.join(", ")
            )));
        }

        let ids: Vec<i32> = recipe.ingredients.iter().map(|(id, _)| *id).collect();
        let ingredients = self.store.get_ingredients_by_ids(&ids).await?;
        if ingredients.len() != ids.len() {
            let known: HashSet<i32> = ingredients.iter().map(|i| i.id).collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(RecipeError::Validation(format!(
                "unknown ingredients: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    async fn load(&self, id: i32) -> Result<Recipe, RecipeError> {
        self.store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound(id))
    }

    async fn load_owned(&self, id: i32, editor_id: i32) -> Result<Recipe, RecipeError> {
        let recipe = self.load(id).await?;
        if recipe.author_id != editor_id {
            return Err(RecipeError::Forbidden);
        }
        Ok(recipe)
    }

    /// Builds full representations for a batch of recipes with a fixed
    /// number of queries regardless of batch size.
    async fn hydrate(
        &self,
        recipes: Vec<Recipe>,
        viewer: Option<i32>,
    ) -> Result<Vec<RecipeDto>, RecipeError> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i32, _> = self
            .store
            .get_users_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let mut tags = self.store.get_recipe_tags(&recipe_ids).await?;
        let mut lines = self.store.get_recipe_lines(&recipe_ids).await?;

        let (followed, favorited, in_cart) = match viewer {
            Some(user_id) => (
                self.store.followed_among(user_id, &author_ids).await?,
                self.store
                    .collection_contains(Collection::Favorites, user_id, &recipe_ids)
                    .await?,
                self.store
                    .collection_contains(Collection::ShoppingCart, user_id, &recipe_ids)
                    .await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    RecipeError::Internal(format!(
                        "Author {} of recipe {} is missing",
                        recipe.author_id, recipe.id
                    ))
                })?;

                Ok(RecipeDto {
                    id: recipe.id,
                    author: UserDto::new(author, followed.contains(&recipe.author_id)),
                    name: recipe.name,
                    image: media_url(&recipe.image),
                    text: recipe.text,
                    ingredients: lines
                        .remove(&recipe.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                    tags: tags
                        .remove(&recipe.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(TagDto::from)
                        .collect(),
                    cooking_time: recipe.cooking_time,
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                })
            })
            .collect()
    }

    async fn hydrate_one(
        &self,
        recipe: Recipe,
        viewer: Option<i32>,
    ) -> Result<RecipeDto, RecipeError> {
        let id = recipe.id;
        self.hydrate(vec![recipe], viewer)
            .await?
            .pop()
            .ok_or(RecipeError::NotFound(id))
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        filter: RecipeFilter,
        page: PageRequest,
        viewer: Option<i32>,
    ) -> Result<Page<RecipeDto>, RecipeError> {
        let (recipes, total) = self
            .store
            .list_recipes(&filter, page.page, page.per_page)
            .await?;

        Ok(Page {
            items: self.hydrate(recipes, viewer).await?,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<RecipeDto, RecipeError> {
        let recipe = self.load(id).await?;
        self.hydrate_one(recipe, viewer).await
    }

    async fn create(
        &self,
        author_id: i32,
        payload: RecipePayload,
    ) -> Result<RecipeDto, RecipeError> {
        let validated = validate_payload(payload, true)?;
        self.check_references(&validated).await?;

        let image = match validated.image.as_deref() {
            Some(data) => Some(self.images.save_data_uri(data, ImageFolder::Recipes).await?),
            None => None,
        };

        let draft = RecipeDraft {
            name: validated.name,
            image: image.clone(),
            text: validated.text,
            cooking_time: validated.cooking_time,
            tag_ids: validated.tag_ids,
            ingredients: validated.ingredients,
        };

        let id = match self.store.create_recipe(author_id, draft).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(stored) = image {
                    self.images.remove(&stored).await;
                }
                return Err(e.into());
            }
        };

        metrics::counter!("foodgram_recipes_created_total").increment(1);
        self.get(id, Some(author_id)).await
    }

    async fn update(
        &self,
        id: i32,
        editor_id: i32,
        payload: RecipePayload,
    ) -> Result<RecipeDto, RecipeError> {
        let existing = self.load_owned(id, editor_id).await?;

        let validated = validate_payload(payload, false)?;
        self.check_references(&validated).await?;

        let image = match validated.image.as_deref() {
            Some(data) => Some(self.images.save_data_uri(data, ImageFolder::Recipes).await?),
            None => None,
        };

        let draft = RecipeDraft {
            name: validated.name,
            image: image.clone(),
            text: validated.text,
            cooking_time: validated.cooking_time,
            tag_ids: validated.tag_ids,
            ingredients: validated.ingredients,
        };

        if let Err(e) = self.store.update_recipe(id, draft).await {
            if let Some(stored) = image {
                self.images.remove(&stored).await;
            }
            return Err(e.into());
        }

        if image.is_some() {
            self.images.remove(&existing.image).await;
        }

        self.get(id, Some(editor_id)).await
    }

    async fn delete(&self, id: i32, editor_id: i32) -> Result<(), RecipeError> {
        let existing = self.load_owned(id, editor_id).await?;

        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound(id));
        }
        self.images.remove(&existing.image).await;

        info!(recipe_id = id, editor_id, "Deleted recipe");
        Ok(())
    }

    async fn add_to(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<Option<ShortRecipeDto>, RecipeError> {
        let recipe = self.load(recipe_id).await?;

        let added = self
            .store
            .add_to_collection(collection, user_id, recipe_id)
            .await?;
        if !added {
            debug!(recipe_id, user_id, collection = collection.label(), "Already present");
            return Ok(None);
        }

        Ok(Some(ShortRecipeDto::from(recipe)))
    }

    async fn remove_from(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), RecipeError> {
        if !self.store.recipe_exists(recipe_id).await? {
            return Err(RecipeError::NotFound(recipe_id));
        }

        if !self
            .store
            .remove_from_collection(collection, user_id, recipe_id)
            .await?
        {
            return Err(RecipeError::NotInCollection(collection.label()));
        }

        Ok(())
    }
}
