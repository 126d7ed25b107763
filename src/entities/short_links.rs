use sea_orm::entity::prelude::*;

/// Alias from a generated short URL to a recipe's canonical URL.
///
/// Rows are never updated or deleted. `origin_url` is not a foreign key, so a
/// deleted recipe leaves its link behind.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "short_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub origin_url: String,
    #[sea_orm(unique)]
    pub short_url: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
