//! Domain service that turns a user's cart into a shopping list.

use crate::models::shopping_list::ShoppingList;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShoppingListError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ShoppingListError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ShoppingListError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ShoppingListService: Send + Sync {
    /// Aggregates every ingredient line of every recipe in the user's cart.
    /// An empty cart yields an empty list.
    async fn build(&self, user_id: i32) -> Result<ShoppingList, ShoppingListError>;
}
