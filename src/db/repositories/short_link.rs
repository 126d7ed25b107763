use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
    sea_query::OnConflict,
};

use crate::entities::{prelude::*, short_links};

/// What happened to a conditional short link insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row for this origin URL already exists (possibly written by a
    /// concurrent request); nothing was written.
    OriginExists,
    /// The short URL belongs to a different origin; nothing was written.
    ShortUrlTaken,
}

pub struct ShortLinkRepository {
    conn: DatabaseConnection,
}

impl ShortLinkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_origin(&self, origin_url: &str) -> Result<Option<short_links::Model>> {
        let row = ShortLinks::find()
            .filter(short_links::Column::OriginUrl.eq(origin_url))
            .one(&self.conn)
            .await
            .context("Failed to query short link by origin")?;

        Ok(row)
    }

    pub async fn find_by_short_url(&self, short_url: &str) -> Result<Option<short_links::Model>> {
        let row = ShortLinks::find()
            .filter(short_links::Column::ShortUrl.eq(short_url))
            .one(&self.conn)
            .await
            .context("Failed to query short link by short URL")?;

        Ok(row)
    }

    /// Inserts the pair unless `origin_url` is already mapped. Both columns
    /// carry unique indexes, so the outcome is decided by SQLite, not by a
    /// prior read.
    pub async fn insert_if_absent(&self, origin_url: &str, short_url: &str) -> Result<InsertOutcome> {
        let active = short_links::ActiveModel {
            origin_url: Set(origin_url.to_string()),
            short_url: Set(short_url.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = ShortLinks::insert(active)
            .on_conflict(
                OnConflict::column(short_links::Column::OriginUrl)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await;

        match result {
            Ok(0) => Ok(InsertOutcome::OriginExists),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::ShortUrlTaken),
                _ => Err(err).context("Failed to insert short link"),
            },
        }
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(ShortLinks::find().count(&self.conn).await?)
    }
}
