//! Catalog import command handlers

use std::path::Path;

use crate::config::Config;
use crate::db::Store;
use crate::services::{CatalogService, ImportSummary, SeaOrmCatalogService};

async fn catalog(config: &Config) -> anyhow::Result<SeaOrmCatalogService> {
    let store = Store::new(&config.general.database_path).await?;
    Ok(SeaOrmCatalogService::new(store))
}

fn report(kind: &str, path: &Path, summary: ImportSummary) {
    println!(
        "✓ Imported {} {kind} from {} ({} read, {} already present)",
        summary.inserted,
        path.display(),
        summary.read,
        summary.skipped()
    );
}

pub async fn cmd_import_ingredients(config: &Config, path: &Path) -> anyhow::Result<()> {
    let summary = catalog(config).await?.import_ingredients(path).await?;
    report("ingredients", path, summary);
    Ok(())
}

pub async fn cmd_import_tags(config: &Config, path: &Path) -> anyhow::Result<()> {
    let summary = catalog(config).await?.import_tags(path).await?;
    report("tags", path, summary);
    Ok(())
}
