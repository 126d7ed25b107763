use crate::config::SecurityConfig;
use crate::entities::{ingredients, short_links, tags};
use crate::models::recipe::{IngredientLine, Recipe, RecipeDraft, RecipeFilter};
use crate::models::shopping_list::CartLine;
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::collection::Collection;
pub use repositories::short_link::InsertOutcome;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn collection_repo(&self) -> repositories::collection::CollectionRepository {
        repositories::collection::CollectionRepository::new(self.conn.clone())
    }

    fn short_link_repo(&self) -> repositories::short_link::ShortLinkRepository {
        repositories::short_link::ShortLinkRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_users_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn list_users(&self, page: u64, per_page: u64) -> Result<(Vec<User>, u64)> {
        self.user_repo().list(page, per_page).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn check_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().check_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, config)
            .await
    }

    pub async fn set_user_avatar(&self, id: i32, avatar: Option<String>) -> Result<()> {
        self.user_repo().set_avatar(id, avatar).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, id: i32) -> Result<String> {
        self.user_repo().regenerate_api_key(id).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().subscribe(user_id, author_id).await
    }

    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo()
            .unsubscribe(user_id, author_id)
            .await
    }

    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        self.subscription_repo()
            .followed_among(user_id, author_ids)
            .await
    }

    pub async fn list_followed_authors(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<User>, u64)> {
        self.subscription_repo()
            .list_authors(user_id, page, per_page)
            .await
    }

    // ========================================================================
    // Tags & ingredients
    // ========================================================================

    pub async fn list_tags(&self) -> Result<Vec<tags::Model>> {
        self.catalog_repo().list_tags().await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<tags::Model>> {
        self.catalog_repo().get_tag(id).await
    }

    pub async fn get_tags_by_ids(&self, ids: &[i32]) -> Result<Vec<tags::Model>> {
        self.catalog_repo().get_tags_by_ids(ids).await
    }

    pub async fn insert_tags(&self, items: Vec<(String, String)>) -> Result<u64> {
        self.catalog_repo().insert_tags(items).await
    }

    pub async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        self.catalog_repo().list_ingredients(prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<ingredients::Model>> {
        self.catalog_repo().get_ingredient(id).await
    }

    pub async fn get_ingredients_by_ids(&self, ids: &[i32]) -> Result<Vec<ingredients::Model>> {
        self.catalog_repo().get_ingredients_by_ids(ids).await
    }

    pub async fn insert_ingredients(&self, items: Vec<(String, String)>) -> Result<u64> {
        self.catalog_repo().insert_ingredients(items).await
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn recipe_exists(&self, id: i32) -> Result<bool> {
        self.recipe_repo().exists(id).await
    }

    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        self.recipe_repo().list(filter, page, per_page).await
    }

    pub async fn list_recipes_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<Recipe>> {
        self.recipe_repo().list_by_author(author_id, limit).await
    }

    pub async fn count_recipes_by_author(&self, author_id: i32) -> Result<u64> {
        self.recipe_repo().count_by_author(author_id).await
    }

    pub async fn get_recipe_tags(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<tags::Model>>> {
        self.recipe_repo().tags_for(recipe_ids).await
    }

    pub async fn get_recipe_lines(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<IngredientLine>>> {
        self.recipe_repo().lines_for(recipe_ids).await
    }

    pub async fn create_recipe(&self, author_id: i32, draft: RecipeDraft) -> Result<i32> {
        self.recipe_repo().create(author_id, draft).await
    }

    pub async fn update_recipe(&self, id: i32, draft: RecipeDraft) -> Result<()> {
        self.recipe_repo().update(id, draft).await
    }

    pub async fn delete_recipe(&self, id: i32) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }

    // ========================================================================
    // Favorites & shopping cart
    // ========================================================================

    pub async fn add_to_collection(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.collection_repo()
            .add(collection, user_id, recipe_id)
            .await
    }

    pub async fn remove_from_collection(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.collection_repo()
            .remove(collection, user_id, recipe_id)
            .await
    }

    pub async fn collection_contains(
        &self,
        collection: Collection,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        self.collection_repo()
            .contained_among(collection, user_id, recipe_ids)
            .await
    }

    pub async fn get_cart_lines(&self, user_id: i32) -> Result<Vec<CartLine>> {
        self.collection_repo().cart_lines(user_id).await
    }

    // ========================================================================
    // Short links
    // ========================================================================

    pub async fn find_short_link_by_origin(
        &self,
        origin_url: &str,
    ) -> Result<Option<short_links::Model>> {
        self.short_link_repo().find_by_origin(origin_url).await
    }

    pub async fn find_short_link(&self, short_url: &str) -> Result<Option<short_links::Model>> {
        self.short_link_repo().find_by_short_url(short_url).await
    }

    pub async fn insert_short_link(&self, origin_url: &str, short_url: &str) -> Result<InsertOutcome> {
        self.short_link_repo()
            .insert_if_absent(origin_url, short_url)
            .await
    }

    pub async fn count_short_links(&self) -> Result<u64> {
        self.short_link_repo().count().await
    }
}
