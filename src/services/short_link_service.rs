//! Domain service for recipe short links.
//!
//! A short link maps the canonical API URL of a recipe to a random 7-letter
//! alias under `/s/`. Links are created lazily on first request and never
//! change afterwards.

use rand::Rng;
use thiserror::Error;

pub const TOKEN_LENGTH: usize = 7;

pub const TOKEN_ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors specific to short link operations.
#[derive(Debug, Error)]
pub enum ShortLinkError {
    #[error("Recipe not found: {0}")]
    RecipeNotFound(i32),

    #[error("Short link not found")]
    LinkNotFound,

    #[error("Could not allocate a unique short link after {0} attempts")]
    Exhausted(u32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ShortLinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ShortLinkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Source of candidate tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws each character uniformly from [`TOKEN_ALPHABET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..TOKEN_LENGTH)
            .map(|_| char::from(TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())]))
            .collect()
    }
}

/// Canonical API URL of a recipe, the key a short link is stored under.
#[must_use]
pub fn origin_url(base: &str, recipe_id: i32) -> String {
    format!("{base}/api/recipes/{recipe_id}/")
}

#[must_use]
pub fn short_url(base: &str, token: &str) -> String {
    format!("{base}/s/{token}")
}

#[must_use]
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Client-facing path for a stored origin URL:
/// `http://host/api/recipes/7/` becomes `/recipes/7`.
pub fn client_path(origin: &str) -> Result<String, ShortLinkError> {
    let parsed = url::Url::parse(origin)
        .map_err(|e| ShortLinkError::Internal(format!("Stored origin URL is invalid: {e}")))?;

    let path = parsed.path();
    let path = path.strip_prefix("/api").unwrap_or(path);
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        return Ok("/".to_string());
    }
    Ok(path.to_string())
}

/// Domain service trait for short links.
#[async_trait::async_trait]
pub trait ShortLinkService: Send + Sync {
    /// Returns the short URL of a recipe, creating it on first use.
    ///
    /// Concurrent callers for the same recipe all receive the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`ShortLinkError::RecipeNotFound`] for an unknown recipe and
    /// [`ShortLinkError::Exhausted`] if every drawn token was already taken.
    async fn get_or_create(&self, recipe_id: i32) -> Result<String, ShortLinkError>;

    /// Resolves a token to the client path of its recipe.
    ///
    /// # Errors
    ///
    /// Returns [`ShortLinkError::LinkNotFound`] for an unknown token.
    async fn resolve(&self, token: &str) -> Result<String, ShortLinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_token_shape() {
        let generator = RandomTokenGenerator;
        for _ in 0..200 {
            let token = generator.generate();
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(is_valid_token(&token), "bad token {token}");
        }
    }

    #[test]
    fn test_random_tokens_differ() {
        let generator = RandomTokenGenerator;
        let tokens: std::collections::HashSet<String> =
            (0..100).map(|_| generator.generate()).collect();
        assert!(tokens.len() > 95);
    }

    #[test]
    fn test_url_builders() {
        assert_eq!(
            origin_url("http://localhost:6789", 42),
            "http://localhost:6789/api/recipes/42/"
        );
        assert_eq!(
            short_url("http://localhost:6789", "AbCdEfG"),
            "http://localhost:6789/s/AbCdEfG"
        );
    }

    #[test]
    fn test_client_path_strips_api_prefix_and_slash() {
        assert_eq!(
            client_path("http://localhost:6789/api/recipes/42/").unwrap(),
            "/recipes/42"
        );
        assert_eq!(
            client_path("https://food.example.org/api/recipes/7").unwrap(),
            "/recipes/7"
        );
    }

    #[test]
    fn test_client_path_rejects_garbage() {
        assert!(client_path("not a url").is_err());
    }

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("ZZZZZZZ"));
        assert!(!is_valid_token("ZZZZZZ"));
        assert!(!is_valid_token("ZZZZZZ1"));
        assert!(!is_valid_token("ZZZZZZZZ"));
    }
}
