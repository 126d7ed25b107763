use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_ingredients_name_unit ON ingredients(name, measurement_unit)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_recipes_created_at ON recipes(created_at)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_recipe_ingredients_ingredient")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_recipes_created_at")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_ingredients_name_unit")
            .await?;

        Ok(())
    }
}
