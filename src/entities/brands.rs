use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Shared reference data, seeded by the initial migration and not
/// scoped to any user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub website_url: Option<String>,

    pub logo_url: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::polishes::Entity")]
    Polishes,
}

impl Related<super::polishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
