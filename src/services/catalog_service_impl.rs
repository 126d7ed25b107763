//! `SeaORM` implementation of the `CatalogService` trait.

use crate::api::types::{IngredientDto, TagDto};
use crate::db::Store;
use crate::services::catalog_service::{
    CatalogError, CatalogService, ImportSummary, parse_ingredients_csv, parse_ingredients_json,
    parse_tags_json,
};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Rows per `INSERT` statement, well under SQLite's bound-parameter limit.
const IMPORT_CHUNK: usize = 500;

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

async fn read_file(path: &Path) -> Result<String, CatalogError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::InvalidFile(format!("{}: {e}", path.display())))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list_tags(&self) -> Result<Vec<TagDto>, CatalogError> {
        let tags = self.store.list_tags().await?;
        Ok(tags.into_iter().map(TagDto::from).collect())
    }

    async fn get_tag(&self, id: i32) -> Result<TagDto, CatalogError> {
        self.store
            .get_tag(id)
            .await?
            .map(TagDto::from)
            .ok_or(CatalogError::TagNotFound(id))
    }

    async fn list_ingredients(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<IngredientDto>, CatalogError> {
        let ingredients = self.store.list_ingredients(prefix).await?;
        Ok(ingredients.into_iter().map(IngredientDto::from).collect())
    }

    async fn get_ingredient(&self, id: i32) -> Result<IngredientDto, CatalogError> {
        self.store
            .get_ingredient(id)
            .await?
            .map(IngredientDto::from)
            .ok_or(CatalogError::IngredientNotFound(id))
    }

    async fn import_ingredients(&self, path: &Path) -> Result<ImportSummary, CatalogError> {
        let content = read_file(path).await?;

        let records = match extension(path).as_str() {
            "json" => parse_ingredients_json(&content)?,
            "csv" => parse_ingredients_csv(&content)?,
            other => {
                return Err(CatalogError::InvalidFile(format!(
                    "unsupported ingredient file type '{other}', expected .json or .csv"
                )));
            }
        };

        let read = records.len();
        let mut inserted = 0;
        for chunk in records.chunks(IMPORT_CHUNK) {
            let rows = chunk
                .iter()
                .map(|r| (r.name.trim().to_string(), r.measurement_unit.trim().to_string()))
                .collect();
            inserted += self.store.insert_ingredients(rows).await?;
        }

        info!(path = %path.display(), read, inserted, "Imported ingredients");
        Ok(ImportSummary { read, inserted })
    }

    async fn import_tags(&self, path: &Path) -> Result<ImportSummary, CatalogError> {
        if extension(path) != "json" {
            return Err(CatalogError::InvalidFile(
                "tags can only be imported from .json".to_string(),
            ));
        }

        let records = parse_tags_json(&read_file(path).await?)?;

        let read = records.len();
        let mut inserted = 0;
        for chunk in records.chunks(IMPORT_CHUNK) {
            let rows = chunk
                .iter()
                .map(|t| (t.name.trim().to_string(), t.slug.trim().to_string()))
                .collect();
            inserted += self.store.insert_tags(rows).await?;
        }

        info!(path = %path.display(), read, inserted, "Imported tags");
        Ok(ImportSummary { read, inserted })
    }
}
