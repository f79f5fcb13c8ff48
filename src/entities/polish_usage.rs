use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "polish_usage")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub polish_id: i32,

    /// Denormalized from the polish so analytics can scan usage
    /// without a join.
    pub user_id: i32,

    pub used_at: String,

    pub occasion: Option<String>,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::polishes::Entity",
        from = "Column::PolishId",
        to = "super::polishes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Polishes,
}

impl Related<super::polishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
