//! `SeaORM` implementation of the `ShortLinkService` trait.

use crate::config::Config;
use crate::db::{InsertOutcome, Store};
use crate::services::short_link_service::{
    RandomTokenGenerator, ShortLinkError, ShortLinkService, TokenGenerator, client_path,
    is_valid_token, origin_url, short_url,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct SeaOrmShortLinkService {
    store: Store,
    config: Arc<RwLock<Config>>,
    generator: Arc<dyn TokenGenerator>,
}

impl SeaOrmShortLinkService {
    #[must_use]
    pub fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self::with_generator(store, config, Arc::new(RandomTokenGenerator))
    }

    #[must_use]
    pub fn with_generator(
        store: Store,
        config: Arc<RwLock<Config>>,
        generator: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            store,
            config,
            generator,
        }
    }

    async fn existing(&self, origin: &str) -> Result<Option<String>, ShortLinkError> {
        Ok(self
            .store
            .find_short_link_by_origin(origin)
            .await?
            .map(|link| link.short_url))
    }
}

#[async_trait]
impl ShortLinkService for SeaOrmShortLinkService {
    async fn get_or_create(&self, recipe_id: i32) -> Result<String, ShortLinkError> {
        if !self.store.recipe_exists(recipe_id).await? {
            return Err(ShortLinkError::RecipeNotFound(recipe_id));
        }

        let (base, max_attempts) = {
            let config = self.config.read().await;
            (
                config.short_links.base().to_string(),
                config.short_links.max_attempts,
            )
        };

        let origin = origin_url(&base, recipe_id);
        if let Some(existing) = self.existing(&origin).await? {
            return Ok(existing);
        }

        for attempt in 1..=max_attempts {
            let candidate = short_url(&base, &self.generator.generate());

            match self.store.insert_short_link(&origin, &candidate).await? {
                InsertOutcome::Inserted => {
                    info!(recipe_id, short_url = %candidate, "Created short link");
                    metrics::counter!("foodgram_short_links_created_total").increment(1);
                    return Ok(candidate);
                }
                InsertOutcome::OriginExists => {
                    debug!(recipe_id, "Short link created concurrently, re-reading");
                    return self.existing(&origin).await?.ok_or_else(|| {
                        ShortLinkError::Internal(format!(
                            "Short link for recipe {recipe_id} vanished after conflict"
                        ))
                    });
                }
                InsertOutcome::ShortUrlTaken => {
                    warn!(recipe_id, attempt, "Short link token collision, retrying");
                    metrics::counter!("foodgram_short_link_collisions_total").increment(1);
                }
            }
        }

        Err(ShortLinkError::Exhausted(max_attempts))
    }

    async fn resolve(&self, token: &str) -> Result<String, ShortLinkError> {
        if !is_valid_token(token) {
            return Err(ShortLinkError::LinkNotFound);
        }

        let base = self.config.read().await.short_links.base().to_string();

        let link = self
            .store
            .find_short_link(&short_url(&base, token))
            .await?
            .ok_or(ShortLinkError::LinkNotFound)?;

        client_path(&link.origin_url)
    }
}
