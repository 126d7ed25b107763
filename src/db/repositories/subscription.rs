use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};
use std::collections::HashSet;

use crate::entities::{prelude::*, subscriptions, users};

use super::user::User;

/// Follower → author edges.
pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns `false` when the subscription already existed.
    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let active = subscriptions::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        let inserted = Subscriptions::insert(active)
            .on_conflict(
                OnConflict::columns([
                    subscriptions::Column::UserId,
                    subscriptions::Column::AuthorId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert subscription")?;

        Ok(inserted > 0)
    }

    /// Returns `false` when there was nothing to remove.
    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Subscriptions::delete_by_id((user_id, author_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete subscription")?;

        Ok(result.rows_affected > 0)
    }

    /// Which of `author_ids` the user follows.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Subscriptions::find()
            .select_only()
            .column(subscriptions::Column::AuthorId)
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.is_in(author_ids.to_vec()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// One page of the authors `user_id` follows, ordered by username.
    pub async fn list_authors(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<User>, u64)> {
        let paginator = Users::find()
            .filter(
                users::Column::Id.in_subquery(
                    sea_orm::sea_query::Query::select()
                        .column(subscriptions::Column::AuthorId)
                        .from(Subscriptions)
                        .and_where(subscriptions::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(users::Column::Username)
            .paginate(&self.conn, per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }
}
