use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        create(manager, &schema, Users).await?;
        create(manager, &schema, Subscriptions).await?;
        create(manager, &schema, Tags).await?;
        create(manager, &schema, Ingredients).await?;
        create(manager, &schema, Recipes).await?;
        create(manager, &schema, RecipeIngredients).await?;
        create(manager, &schema, RecipeTags).await?;
        create(manager, &schema, Favorites).await?;
        create(manager, &schema, ShoppingCart).await?;
        create(manager, &schema, ShortLinks).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShortLinks).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingCart).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeTags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
