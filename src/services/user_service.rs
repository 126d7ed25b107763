//! Domain service for accounts, avatars, passwords and subscriptions.

use crate::api::types::{AvatarDto, CreatedUserDto, SubscriptionDto, UserDto};
use crate::models::recipe::{Page, PageRequest};
use crate::services::image::ImageError;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;

/// Usernames that would shadow fixed routes under `/api/users/`.
const RESERVED_USERNAMES: &[&str] = &["me", "subscriptions", "set_password"];

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ImageError> for UserError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidDataUri(msg) => Self::Validation(format!("avatar: {msg}")),
            ImageError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid regex"))
}

fn required(field: &str, value: &str, max: usize) -> Result<(), UserError> {
    if value.trim().is_empty() {
        return Err(UserError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(UserError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Field checks for registration; uniqueness is checked against the store.
pub fn validate_registration(
    request: &RegisterRequest,
    min_password_length: usize,
) -> Result<(), UserError> {
    required("email", &request.email, MAX_EMAIL_LEN)?;
    match request.email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(UserError::Validation("email is invalid".to_string())),
    }

    required("username", &request.username, MAX_NAME_LEN)?;
    if !username_regex().is_match(&request.username) {
        return Err(UserError::Validation(
            "username may only contain letters, digits and .@+-_".to_string(),
        ));
    }
    if RESERVED_USERNAMES.contains(&request.username.as_str()) {
        return Err(UserError::Validation(format!(
            "username '{}' is reserved",
            request.username
        )));
    }

    required("first_name", &request.first_name, MAX_NAME_LEN)?;
    required("last_name", &request.last_name, MAX_NAME_LEN)?;

    if request.password.chars().count() < min_password_length {
        return Err(UserError::Validation(format!(
            "password must be at least {min_password_length} characters"
        )));
    }

    Ok(())
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for bad fields or a taken email/username.
    async fn register(&self, request: RegisterRequest) -> Result<CreatedUserDto, UserError>;

    async fn list(&self, page: PageRequest, viewer: Option<i32>)
    -> Result<Page<UserDto>, UserError>;

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<UserDto, UserError>;

    async fn set_avatar(&self, user_id: i32, data: &str) -> Result<AvatarDto, UserError>;

    async fn delete_avatar(&self, user_id: i32) -> Result<(), UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::Validation`] if `current` is wrong or `new` too short.
    async fn set_password(&self, user_id: i32, current: &str, new: &str)
    -> Result<(), UserError>;

    /// # Errors
    ///
    /// Self-subscription and duplicates are [`UserError::Validation`].
    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError>;

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError>;

    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "cook@example.com".to_string(),
            username: "cook.42".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Cook".to_string(),
            password: "long enough".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&request(), 8).is_ok());
    }

    #[test]
    fn test_username_pattern() {
        let mut r = request();
        r.username = "bad name".to_string();
        assert!(validate_registration(&r, 8).is_err());

        r.username = "ok_name+tag@x-y".to_string();
        assert!(validate_registration(&r, 8).is_ok());

        r.username = "me".to_string();
        assert!(validate_registration(&r, 8).is_err());
    }

    #[test]
    fn test_email_and_password() {
        let mut r = request();
        r.email = "nobody".to_string();
        assert!(validate_registration(&r, 8).is_err());

        let mut r = request();
        r.password = "short".to_string();
        assert!(validate_registration(&r, 8).is_err());
    }

    #[test]
    fn test_missing_names() {
        let mut r = request();
        r.first_name = String::new();
        assert!(validate_registration(&r, 8).is_err());

        let mut r = request();
        r.last_name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_registration(&r, 8).is_err());
    }
}
