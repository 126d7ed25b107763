//! Domain service for authentication.
//!
//! Handles email/password login, API key lookup and key rotation on logout.

use crate::db::User;
use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result: the account id plus the token clients send back.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    #[serde(skip)]
    pub user_id: i32,
    pub auth_token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the user's token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Returns the user owning `api_key`, if any.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;

    async fn get_user(&self, id: i32) -> Result<User, AuthError>;

    /// Invalidates the user's current token and returns the new one.
    async fn rotate_api_key(&self, id: i32) -> Result<String, AuthError>;
}
