use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub email: String,

    pub name: String,

    pub avatar_url: Option<String>,

    /// `"google"`, `"github"` or `"dev"`.
    pub provider: String,

    /// Stable subject id issued by the provider. Unique together with
    /// `provider` (index created by the initial migration).
    pub provider_id: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::polishes::Entity")]
    Polishes,
    #[sea_orm(has_many = "super::custom_collections::Entity")]
    CustomCollections,
}

impl Related<super::polishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Polishes.def()
    }
}

impl Related<super::custom_collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomCollections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
