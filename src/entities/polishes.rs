use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "polishes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub brand_id: Option<i32>,

    pub name: String,

    /// `#RRGGBB`, validated at the API boundary.
    pub color_hex: Option<String>,

    /// One of: cream, shimmer, glitter, matte, magnetic, thermal.
    pub finish_type: String,

    /// Free-form product line name ("Muse Collection" etc), distinct
    /// from the user's custom collections.
    pub collection_name: Option<String>,

    pub purchase_date: Option<String>,

    pub purchase_price: Option<f64>,

    pub purchase_location: Option<String>,

    pub notes: Option<String>,

    /// 1 to 5.
    pub rating: Option<i32>,

    pub is_favorite: bool,

    /// JSON array of tag strings.
    pub custom_tags: Option<String>,

    pub bottle_image_url: Option<String>,

    pub swatch_image_url: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::brands::Entity",
        from = "Column::BrandId",
        to = "super::brands::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Brands,
    #[sea_orm(has_many = "super::polish_usage::Entity")]
    PolishUsage,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::brands::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brands.def()
    }
}

impl Related<super::polish_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PolishUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
