//! `SeaORM` implementation of the `AuthService` trait.

use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .verify_user_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        info!(user_id = user.id, "User logged in");

        Ok(LoginResult {
            user_id: user.id,
            auth_token: user.api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.verify_api_key(api_key).await?)
    }

    async fn get_user(&self, id: i32) -> Result<User, AuthError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn rotate_api_key(&self, id: i32) -> Result<String, AuthError> {
        let key = self.store.regenerate_user_api_key(id).await?;
        info!(user_id = id, "API key rotated");
        Ok(key)
    }
}
