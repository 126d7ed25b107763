//! `SeaORM` implementation of the `ShoppingListService` trait.

use crate::db::Store;
use crate::models::shopping_list::ShoppingList;
use crate::services::shopping_list_service::{ShoppingListError, ShoppingListService};
use async_trait::async_trait;
use tracing::debug;

pub struct SeaOrmShoppingListService {
    store: Store,
}

impl SeaOrmShoppingListService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShoppingListService for SeaOrmShoppingListService {
    async fn build(&self, user_id: i32) -> Result<ShoppingList, ShoppingListError> {
        let lines = self.store.get_cart_lines(user_id).await?;
        let line_count = lines.len();

        let list = ShoppingList::aggregate(lines);

        debug!(
            user_id,
            lines = line_count,
            items = list.items.len(),
            "Built shopping list"
        );
        Ok(list)
    }
}
