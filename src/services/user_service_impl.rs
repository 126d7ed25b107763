//! `SeaORM` implementation of the `UserService` trait.

use crate::api::types::{AvatarDto, CreatedUserDto, ShortRecipeDto, SubscriptionDto, UserDto};
use crate::config::Config;
use crate::db::{NewUser, Store, User};
use crate::models::recipe::{Page, PageRequest};
use crate::services::image::{ImageFolder, ImageService, media_url};
use crate::services::user_service::{
    RegisterRequest, UserError, UserService, validate_registration,
};
use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub struct SeaOrmUserService {
    store: Store,
    config: Arc<RwLock<Config>>,
    images: ImageService,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>, images: ImageService) -> Self {
        Self {
            store,
            config,
            images,
        }
    }

    async fn load(&self, id: i32) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn subscription_dto(
        &self,
        author: User,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError> {
        let recipes = self
            .store
            .list_recipes_by_author(author.id, recipes_limit)
            .await?;
        let recipes_count = self.store.count_recipes_by_author(author.id).await?;

        Ok(SubscriptionDto {
            user: UserDto::new(author, true),
            recipes: recipes.into_iter().map(ShortRecipeDto::from).collect(),
            recipes_count,
        })
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, request: RegisterRequest) -> Result<CreatedUserDto, UserError> {
        let security = self.config.read().await.security.clone();
        validate_registration(&request, security.min_password_length)?;

        if self.store.get_user_by_email(&request.email).await?.is_some() {
            return Err(UserError::Validation(
                "a user with this email already exists".to_string(),
            ));
        }
        if self
            .store
            .get_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(UserError::Validation(
                "a user with this username already exists".to_string(),
            ));
        }

        let new_user = NewUser {
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            password: request.password,
        };

        let user = self
            .store
            .create_user(new_user, &security)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::Validation("email or username is already taken".to_string())
                } else {
                    UserError::from(e)
                }
            })?;

        info!(user_id = user.id, username = %user.username, "Registered user");
        metrics::counter!("foodgram_users_registered_total").increment(1);
        Ok(CreatedUserDto::from(user))
    }

    async fn list(
        &self,
        page: PageRequest,
        viewer: Option<i32>,
    ) -> Result<Page<UserDto>, UserError> {
        let (users, total) = self.store.list_users(page.page, page.per_page).await?;

        let followed = match viewer {
            Some(viewer) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.store.followed_among(viewer, &ids).await?
            }
            None => Default::default(),
        };

        Ok(Page {
            items: users
                .into_iter()
                .map(|u| {
                    let subscribed = followed.contains(&u.id);
                    UserDto::new(u, subscribed)
                })
                .collect(),
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<UserDto, UserError> {
        let user = self.load(id).await?;

        let subscribed = match viewer {
            Some(viewer) if viewer != id => {
                self.store.followed_among(viewer, &[id]).await?.contains(&id)
            }
            _ => false,
        };

        Ok(UserDto::new(user, subscribed))
    }

    async fn set_avatar(&self, user_id: i32, data: &str) -> Result<AvatarDto, UserError> {
        let user = self.load(user_id).await?;

        let stored = self
            .images
            .save_data_uri(data, ImageFolder::Avatars)
            .await?;
        self.store
            .set_user_avatar(user_id, Some(stored.clone()))
            .await?;

        if let Some(previous) = user.avatar {
            self.images.remove(&previous).await;
        }

        Ok(AvatarDto {
            avatar: media_url(&stored),
        })
    }

    async fn delete_avatar(&self, user_id: i32) -> Result<(), UserError> {
        let user = self.load(user_id).await?;

        if let Some(previous) = user.avatar {
            self.store.set_user_avatar(user_id, None).await?;
            self.images.remove(&previous).await;
        }

        Ok(())
    }

    async fn set_password(
        &self,
        user_id: i32,
        current: &str,
        new: &str,
    ) -> Result<(), UserError> {
        let security = self.config.read().await.security.clone();

        if new.chars().count() < security.min_password_length {
            return Err(UserError::Validation(format!(
                "new password must be at least {} characters",
                security.min_password_length
            )));
        }

        if current == new {
            return Err(UserError::Validation(
                "new password must be different from current password".to_string(),
            ));
        }

        if !self.store.check_user_password(user_id, current).await? {
            return Err(UserError::Validation(
                "current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new, &security)
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError> {
        let author = self.load(author_id).await?;

        if user_id == author_id {
            return Err(UserError::Validation(
                "you cannot subscribe to yourself".to_string(),
            ));
        }

        if !self.store.subscribe(user_id, author_id).await? {
            return Err(UserError::Validation(format!(
                "already subscribed to {}",
                author.username
            )));
        }

        self.subscription_dto(author, recipes_limit).await
    }

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError> {
        self.load(author_id).await?;

        if !self.store.unsubscribe(user_id, author_id).await? {
            return Err(UserError::Validation(
                "you are not subscribed to this user".to_string(),
            ));
        }

        Ok(())
    }

    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError> {
        let (authors, total) = self
            .store
            .list_followed_authors(user_id, page.page, page.per_page)
            .await?;

        let mut items = Vec::with_capacity(authors.len());
        for author in authors {
            items.push(self.subscription_dto(author, recipes_limit).await?);
        }

        Ok(Page {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }
}
