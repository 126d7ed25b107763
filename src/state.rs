use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, ImageService, RecipeService, SeaOrmAuthService,
    SeaOrmCatalogService, SeaOrmRecipeService, SeaOrmShoppingListService,
    SeaOrmShortLinkService, SeaOrmUserService, ShoppingListService, ShortLinkService,
    TokenGenerator, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub image_service: ImageService,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub shopping_list_service: Arc<dyn ShoppingListService>,

    pub short_link_service: Arc<dyn ShortLinkService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_store(config, store, None))
    }

    /// Same as [`SharedState::new`] with a custom short link token source.
    pub async fn with_token_generator(
        config: Config,
        generator: Arc<dyn TokenGenerator>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_store(config, store, Some(generator)))
    }

    fn from_store(
        config: Config,
        store: Store,
        generator: Option<Arc<dyn TokenGenerator>>,
    ) -> Self {
        let image_service = ImageService::new(&config.general.images_path);
        let config = Arc::new(RwLock::new(config));

        let short_link_service: Arc<dyn ShortLinkService> = match generator {
            Some(generator) => Arc::new(SeaOrmShortLinkService::with_generator(
                store.clone(),
                config.clone(),
                generator,
            )),
            None => Arc::new(SeaOrmShortLinkService::new(store.clone(), config.clone())),
        };

        Self {
            auth_service: Arc::new(SeaOrmAuthService::new(store.clone())),
            user_service: Arc::new(SeaOrmUserService::new(
                store.clone(),
                config.clone(),
                image_service.clone(),
            )),
            catalog_service: Arc::new(SeaOrmCatalogService::new(store.clone())),
            recipe_service: Arc::new(SeaOrmRecipeService::new(
                store.clone(),
                image_service.clone(),
            )),
            shopping_list_service: Arc::new(SeaOrmShoppingListService::new(store.clone())),
            short_link_service,
            image_service,
            config,
            store,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
