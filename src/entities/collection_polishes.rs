use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Membership join table. Composite key keeps duplicate adds out at
/// the schema level.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "collection_polishes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub polish_id: i32,

    pub added_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custom_collections::Entity",
        from = "Column::CollectionId",
        to = "super::custom_collections::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CustomCollections,
    #[sea_orm(
        belongs_to = "super::polishes::Entity",
        from = "Column::PolishId",
        to = "super::polishes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Polishes,
}

impl Related<super::custom_collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomCollections.def()
    }
}

impl Related<super::polishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
