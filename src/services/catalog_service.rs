//! Domain service for the tag and ingredient catalog.
//!
//! Besides read access for the API, this handles bulk import of catalog
//! files. Imports are idempotent: rows that already exist are skipped.

use crate::api::types::{IngredientDto, TagDto};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Tag not found: {0}")]
    TagNotFound(i32),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i32),

    #[error("Invalid catalog file: {0}")]
    InvalidFile(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub slug: String,
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub read: usize,
    pub inserted: u64,
}

impl ImportSummary {
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        (self.read as u64).saturating_sub(self.inserted)
    }
}

fn unquote(field: &str) -> String {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
        .replace("\"\"", "\"")
}

/// Position of the last comma outside double quotes.
fn separator(line: &str) -> Option<usize> {
    let mut quoted = false;
    let mut last = None;
    for (pos, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => last = Some(pos),
            _ => {}
        }
    }
    last
}

/// `name,unit` per line. Either field may be double-quoted to carry commas;
/// unquoted commas in the name are kept because the split happens at the
/// last unquoted comma.
pub fn parse_ingredients_csv(content: &str) -> Result<Vec<IngredientRecord>, CatalogError> {
    let mut records = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, unit) = separator(line)
            .map(|pos| (&line[..pos], &line[pos + 1..]))
            .ok_or_else(|| {
                CatalogError::InvalidFile(format!("line {}: expected 'name,unit'", index + 1))
            })?;

        let name = unquote(name);
        let measurement_unit = unquote(unit);
        if name.is_empty() || measurement_unit.is_empty() {
            return Err(CatalogError::InvalidFile(format!(
                "line {}: empty name or unit",
                index + 1
            )));
        }

        records.push(IngredientRecord {
            name,
            measurement_unit,
        });
    }

    Ok(records)
}

pub fn parse_ingredients_json(content: &str) -> Result<Vec<IngredientRecord>, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::InvalidFile(e.to_string()))
}

pub fn parse_tags_json(content: &str) -> Result<Vec<TagRecord>, CatalogError> {
    let records: Vec<TagRecord> =
        serde_json::from_str(content).map_err(|e| CatalogError::InvalidFile(e.to_string()))?;

    if let Some(bad) = records
        .iter()
        .find(|t| t.name.trim().is_empty() || t.slug.trim().is_empty())
    {
        return Err(CatalogError::InvalidFile(format!(
            "tag with empty name or slug: {bad:?}"
        )));
    }

    Ok(records)
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<TagDto>, CatalogError>;

    async fn get_tag(&self, id: i32) -> Result<TagDto, CatalogError>;

    /// Ingredients ordered by name, optionally restricted to a name prefix.
    async fn list_ingredients(&self, prefix: Option<&str>)
    -> Result<Vec<IngredientDto>, CatalogError>;

    async fn get_ingredient(&self, id: i32) -> Result<IngredientDto, CatalogError>;

    /// Loads a `.json` or `.csv` ingredient file.
    async fn import_ingredients(&self, path: &Path) -> Result<ImportSummary, CatalogError>;

    /// Loads a `.json` tag file.
    async fn import_tags(&self, path: &Path) -> Result<ImportSummary, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let csv = "абрикосовое варенье,г\n\"salt, coarse\",g\n\nwater , ml\n";
        let records = parse_ingredients_csv(csv).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].measurement_unit, "г");
        assert_eq!(records[1].name, "salt, coarse");
        assert_eq!(records[2].name, "water");
        assert_eq!(records[2].measurement_unit, "ml");
    }

    #[test]
    fn test_parse_csv_quoted_unit_with_comma() {
        let records = parse_ingredients_csv("pepper,\"pinch, ground\"\nsalt, sea,g\n").unwrap();
        assert_eq!(records[0].name, "pepper");
        assert_eq!(records[0].measurement_unit, "pinch, ground");
        assert_eq!(records[1].name, "salt, sea");
        assert_eq!(records[1].measurement_unit, "g");
    }

    #[test]
    fn test_parse_csv_rejects_missing_unit() {
        assert!(parse_ingredients_csv("flour\n").is_err());
        assert!(parse_ingredients_csv("flour,\n").is_err());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[{"name": "flour", "measurement_unit": "g"}]"#;
        let records = parse_ingredients_json(json).unwrap();
        assert_eq!(
            records,
            vec![IngredientRecord {
                name: "flour".to_string(),
                measurement_unit: "g".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_tags() {
        let json = r#"[{"name": "Breakfast", "slug": "breakfast"}]"#;
        assert_eq!(parse_tags_json(json).unwrap().len(), 1);
        assert!(parse_tags_json(r#"[{"name": "", "slug": "x"}]"#).is_err());
        assert!(parse_tags_json("{}").is_err());
    }

    #[test]
    fn test_summary_skipped() {
        let summary = ImportSummary {
            read: 10,
            inserted: 7,
        };
        assert_eq!(summary.skipped(), 3);
    }
}
