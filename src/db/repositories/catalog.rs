//! Tags and ingredients: read-mostly reference data shared by all recipes.

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{LikeExpr, OnConflict},
};

use crate::entities::{ingredients, prelude::*, tags};

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn list_tags(&self) -> Result<Vec<tags::Model>> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list tags")?;

        Ok(rows)
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<tags::Model>> {
        Ok(Tags::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_tags_by_ids(&self, ids: &[i32]) -> Result<Vec<tags::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Tags::find()
            .filter(tags::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Inserts tags, skipping any whose name or slug already exists.
    /// Returns the number of rows actually inserted.
    pub async fn insert_tags(&self, items: Vec<(String, String)>) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let models = items.into_iter().map(|(name, slug)| tags::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        });

        let inserted = Tags::insert_many(models)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert tags")?;

        Ok(inserted)
    }

    // ========================================================================
    // Ingredients
    // ========================================================================

    /// Ingredients ordered by name, optionally restricted to names starting
    /// with `prefix` (case-insensitive for ASCII).
    pub async fn list_ingredients(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        let mut query = Ingredients::find();

        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            let pattern = LikeExpr::new(format!("{}%", escape_like(prefix))).escape('\\');
            query = query.filter(ingredients::Column::Name.like(pattern));
        }

        let rows = query
            .order_by_asc(ingredients::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list ingredients")?;

        Ok(rows)
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<ingredients::Model>> {
        Ok(Ingredients::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_ingredients_by_ids(&self, ids: &[i32]) -> Result<Vec<ingredients::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Ingredients::find()
            .filter(ingredients::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Inserts ingredients, skipping `(name, unit)` pairs that already exist.
    /// Returns the number of rows actually inserted.
    pub async fn insert_ingredients(&self, items: Vec<(String, String)>) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let models = items
            .into_iter()
            .map(|(name, measurement_unit)| ingredients::ActiveModel {
                name: Set(name),
                measurement_unit: Set(measurement_unit),
                ..Default::default()
            });

        let inserted = Ingredients::insert_many(models)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert ingredients")?;

        Ok(inserted)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("sug%ar_"), r"sug\%ar\_");
        assert_eq!(escape_like("мука"), "мука");
    }
}
